/*
Radix-2 FFT
===========

The Discrete Fourier Transform turns N time-domain samples into N complex
frequency bins:

    X[k] = Σ_n x[n] · e^(-2πi·nk/N)        k = 0..N-1

Evaluated directly that is N² complex multiplies. Cooley–Tukey splits the sum
into even and odd samples, each of which is itself a DFT of half the size:

    X[k]       = E[k] + W^k · O[k]
    X[k + N/2] = E[k] - W^k · O[k]          W = e^(-2πi/N)

Applying the split recursively gives log2(N) stages of N/2 "butterflies",
O(N log N) in total.


In-place Layout
---------------

Recursion is unrolled bottom-up. If the input is first permuted so that
element i sits at bit-reverse(i), every stage's butterflies operate on
neighbouring blocks:

    size 2:  [x0 x4] [x2 x6] [x1 x5] [x3 x7]
    size 4:  [x0 x2 x4 x6]   [x1 x3 x5 x7]
    size 8:  [x0 .. x7]

so the whole transform runs in the input buffers with no scratch memory.


Twiddle Factors
---------------

Within one stage the twiddles are successive powers of a single root:
W^0, W^1, W^2, ... We compute cos/sin of the stage angle once and advance the
running twiddle by complex multiplication, so there is no trig call inside
the butterfly loop.
*/

use std::f64::consts::PI;

/// In-place forward DFT over split real/imaginary buffers.
///
/// On return `re[k]`, `im[k]` hold bin `X[k]`.
///
/// # Panics
///
/// If the buffers differ in length or the length is not a power of two.
/// Those are caller bugs, not runtime conditions.
pub fn fft(re: &mut [f64], im: &mut [f64]) {
    let n = re.len();
    assert_eq!(n, im.len(), "fft: real and imaginary buffers differ in length");
    assert!(
        n.is_power_of_two(),
        "fft: length {n} is not a power of two"
    );

    bit_reverse_permute(re, im);

    let mut size = 2;
    while size <= n {
        let half = size / 2;
        let angle = -2.0 * PI / size as f64;
        let (w_im, w_re) = angle.sin_cos();

        for start in (0..n).step_by(size) {
            let mut cur_re = 1.0;
            let mut cur_im = 0.0;

            for k in 0..half {
                let even = start + k;
                let odd = even + half;

                let t_re = cur_re * re[odd] - cur_im * im[odd];
                let t_im = cur_re * im[odd] + cur_im * re[odd];

                re[odd] = re[even] - t_re;
                im[odd] = im[even] - t_im;
                re[even] += t_re;
                im[even] += t_im;

                let next_re = cur_re * w_re - cur_im * w_im;
                cur_im = cur_re * w_im + cur_im * w_re;
                cur_re = next_re;
            }
        }

        size *= 2;
    }
}

/// In-place inverse DFT, scaled by 1/N.
///
/// Uses `ifft(X) = conj(fft(conj(X))) / N`, so it shares the forward kernel's
/// preconditions.
pub fn ifft(re: &mut [f64], im: &mut [f64]) {
    for v in im.iter_mut() {
        *v = -*v;
    }
    fft(re, im);

    let scale = 1.0 / re.len() as f64;
    for (r, i) in re.iter_mut().zip(im.iter_mut()) {
        *r *= scale;
        *i = -*i * scale;
    }
}

fn bit_reverse_permute(re: &mut [f64], im: &mut [f64]) {
    let n = re.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;

        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
    }
}

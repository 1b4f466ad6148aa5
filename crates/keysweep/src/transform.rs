/// A per-key function producing a fixed-size digest.
///
/// Workers apply a [`Transform`] to every key they enumerate. Any
/// `Fn(&[u8]) -> [u8; N]` is a transform, so closures and plain functions can
/// be passed directly.
///
/// # Example
/// ```
/// use keysweep::Transform;
///
/// let xor = |key: &[u8]| [key.iter().fold(0u8, |acc, b| acc ^ b)];
/// assert_eq!(xor.digest(b"ab"), [b'a' ^ b'b']);
/// ```
pub trait Transform<const N: usize> {
    fn digest(&self, input: &[u8]) -> [u8; N];
}

impl<F, const N: usize> Transform<N> for F
where
    F: Fn(&[u8]) -> [u8; N],
{
    #[inline]
    fn digest(&self, input: &[u8]) -> [u8; N] {
        self(input)
    }
}

/// MD5 over the raw key bytes.
#[cfg_attr(docsrs, doc(cfg(feature = "md5")))]
#[cfg(feature = "md5")]
#[derive(Clone, Copy, Debug, Default)]
pub struct Md5;

#[cfg(feature = "md5")]
impl Transform<16> for Md5 {
    #[inline]
    fn digest(&self, input: &[u8]) -> [u8; 16] {
        use md5::Digest;
        md5::Md5::digest(input).into()
    }
}

/// SHA-256 over the raw key bytes.
#[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
#[cfg(feature = "sha2")]
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256;

#[cfg(feature = "sha2")]
impl Transform<32> for Sha256 {
    #[inline]
    fn digest(&self, input: &[u8]) -> [u8; 32] {
        use sha2::Digest;
        sha2::Sha256::digest(input).into()
    }
}

/// BLAKE3 over the raw key bytes.
#[cfg_attr(docsrs, doc(cfg(feature = "blake3")))]
#[cfg(feature = "blake3")]
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3;

#[cfg(feature = "blake3")]
impl Transform<32> for Blake3 {
    #[inline]
    fn digest(&self, input: &[u8]) -> [u8; 32] {
        blake3::hash(input).into()
    }
}

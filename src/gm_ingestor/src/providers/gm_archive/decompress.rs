use std::io;

/// Leading bytes of an XZ container.
pub const XZ_MAGIC: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];

/// Turns a downloaded archive file into plain CSV bytes.
pub trait Decompressor: Send + Sync + std::fmt::Debug {
    fn decompress(&self, raw: Vec<u8>) -> io::Result<Vec<u8>>;
}

/// Hands bytes through untouched. For servers (or proxies) that deliver the
/// files already unpacked. XZ input is refused rather than fed to the CSV parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Decompressor for Passthrough {
    fn decompress(&self, raw: Vec<u8>) -> io::Result<Vec<u8>> {
        if raw.starts_with(&XZ_MAGIC) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "payload is XZ-compressed; configure a Decompressor that can unpack it",
            ));
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bytes_pass() {
        let csv = b"timestamp,close\n".to_vec();
        assert_eq!(Passthrough.decompress(csv.clone()).unwrap(), csv);
    }

    #[test]
    fn xz_bytes_are_refused() {
        let mut raw = XZ_MAGIC.to_vec();
        raw.extend_from_slice(b"...");
        let err = Passthrough.decompress(raw).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read a text file written in UTF-8 or one of the legacy 8-bit code pages
pub(crate) fn read_with_unknown_encoding(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let size = file.metadata().map(|m| m.len() as usize).ok();
    let mut buf = Vec::with_capacity(size.unwrap_or(0));
    file.read_to_end(&mut buf)?;
    Ok(decode(&buf))
}

pub(crate) fn decode(bytes: &[u8]) -> String {
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding: &'static encoding_rs::Encoding = detector.guess(None, true);
    log::trace!("Decoding as {}", encoding.name());
    encoding.decode(bytes).0.into_owned()
}

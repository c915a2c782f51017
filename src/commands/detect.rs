use crate::detect::classify;
use crate::error::Result;
use std::fs;
use std::path::Path;
use zeroize::Zeroizing;

/// Print the encoding of the private key in `key_file`
pub fn detect(key_file: &Path) -> Result<()> {
    let raw = Zeroizing::new(fs::read_to_string(key_file)?);
    println!("{}", classify(&raw));
    Ok(())
}

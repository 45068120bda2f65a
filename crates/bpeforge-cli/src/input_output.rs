use std::{
    fs::File,
    io::{BufWriter, Write},
};

/// Map ``-`` to standard io.
pub fn squash_standard_io(path: &Option<String>) -> Option<&str> {
    match path.as_deref() {
        Some("-") | None => None,
        Some(p) => Some(p),
    }
}

/// Open a writer for `path`; standard output when ``None`` or ``-``.
pub fn open_writer(path: &Option<String>) -> Result<Box<dyn Write>, Box<dyn std::error::Error>> {
    Ok(match squash_standard_io(path) {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squash_standard_io() {
        assert_eq!(squash_standard_io(&None), None);
        assert_eq!(squash_standard_io(&Some("-".to_string())), None);
        assert_eq!(
            squash_standard_io(&Some("vocab.tiktoken".to_string())),
            Some("vocab.tiktoken")
        );
    }
}

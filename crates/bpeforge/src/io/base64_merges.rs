//! # Base64 Merge List IO

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use base64::{Engine, prelude::BASE64_STANDARD};

use crate::{
    errors::BFResult,
    io::{decode_field, split_line},
    types::SpanPair,
};

/// Save merge rules to a base64 merges file.
///
/// Lines are:
/// ```terminaloutput
/// {BASE64 A} {BASE64 B}
/// ```
pub fn write_base64_merges_path<P: AsRef<Path>>(
    merges: &[SpanPair],
    path: P,
) -> BFResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_base64_merges(merges, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write merge rules to a [`Write`] writer, in merge order.
pub fn write_base64_merges<W: Write>(
    merges: &[SpanPair],
    writer: &mut W,
) -> BFResult<()> {
    for (a, b) in merges {
        writeln!(
            writer,
            "{} {}",
            BASE64_STANDARD.encode(a),
            BASE64_STANDARD.encode(b)
        )?;
    }
    Ok(())
}

/// Load merge rules from a base64 merges file.
pub fn load_base64_merges_path<P: AsRef<Path>>(path: P) -> BFResult<Vec<SpanPair>> {
    read_base64_merges(BufReader::new(File::open(path)?))
}

/// Read merge rules from a base64 merges line reader.
pub fn read_base64_merges<R: BufRead>(reader: R) -> BFResult<Vec<SpanPair>> {
    let mut merges = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.is_empty() {
            continue;
        }

        let (a, b) = split_line(line_no, &line)?;
        merges.push((decode_field(line_no, a)?, decode_field(line_no, b)?));
    }

    Ok(merges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BpeForgeError;

    #[test]
    fn test_write_read_merges() {
        // Spaces and non-UTF-8 bytes survive the base64 encoding.
        let merges: Vec<SpanPair> = vec![
            (b" ".to_vec(), b"t".to_vec()),
            (b" t".to_vec(), b"he".to_vec()),
            (vec![0xC3], vec![0xA9]),
        ];

        let mut buf: Vec<u8> = Vec::new();
        write_base64_merges(&merges, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf.clone()).unwrap(),
            "IA== dA==\nIHQ= aGU=\nww== qQ==\n"
        );

        assert_eq!(read_base64_merges(buf.as_slice()).unwrap(), merges);
    }

    #[test]
    fn test_save_load_merges() {
        let merges: Vec<SpanPair> = vec![(b"a".to_vec(), b"b".to_vec())];

        tempdir::TempDir::new("merges_test")
            .and_then(|dir| {
                let path = dir.path().join("merges.txt");

                write_base64_merges_path(&merges, &path).expect("Failed to save merges");
                let loaded = load_base64_merges_path(&path).expect("Failed to load merges");
                assert_eq!(loaded, merges);

                Ok(())
            })
            .unwrap();

        let empty: Vec<SpanPair> = vec![];
        let mut buf: Vec<u8> = Vec::new();
        write_base64_merges(&empty, &mut buf).unwrap();
        assert!(buf.is_empty());
        assert!(read_base64_merges(buf.as_slice()).unwrap().is_empty());
    }

    #[test]
    fn test_read_errors() {
        assert!(matches!(
            read_base64_merges("YQ==".as_bytes()),
            Err(BpeForgeError::Parse(_))
        ));
        assert!(matches!(
            read_base64_merges("YQ== ***".as_bytes()),
            Err(BpeForgeError::Parse(_))
        ));
    }
}

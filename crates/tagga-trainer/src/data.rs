//! Line-delimited JSON training sets.
//!
//! One [`TrainingExample`] per line, `{"text": ..., "entities": [...]}`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tagga_core::TrainingExample;

use crate::error::Result;

/// Loads examples from a JSONL file. Blank lines are skipped.
pub fn load_examples<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingExample>> {
    let reader = BufReader::new(File::open(path)?);

    let mut examples = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        examples.push(serde_json::from_str(line)?);
    }

    Ok(examples)
}

/// Writes `examples` as JSONL, replacing any existing file.
pub fn save_examples<P: AsRef<Path>>(path: P, examples: &[TrainingExample]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for example in examples {
        serde_json::to_writer(&mut writer, example)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tagga_core::EntitySpan;

    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.jsonl");
        let examples = vec![
            TrainingExample::new("Knows Rust", vec![EntitySpan::new(6, 10, "SKILL")]),
            TrainingExample::new("Nothing", vec![]),
        ];

        save_examples(&path, &examples).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
        assert_eq!(load_examples(&path).unwrap(), examples);
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.jsonl");
        fs::write(
            &path,
            "\n{\"text\": \"Go\", \"entities\": [{\"start\": 0, \"end\": 2, \"label\": \"SKILL\"}]}\n\n",
        )
        .unwrap();

        let examples = load_examples(&path).unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].entities[0].label, "SKILL");
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.jsonl");
        fs::write(&path, "not json\n").unwrap();
        assert!(load_examples(&path).is_err());
    }
}

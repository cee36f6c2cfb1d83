use anyhow::Result;
use std::path::Path;

/// A flat run of words loaded at `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub base: u16,
    pub words: Vec<u16>,
}

impl Image {
    /// One past the last loaded address, saturating at the top of memory.
    pub fn end(&self) -> u32 {
        (self.base as u32 + self.words.len() as u32).min(0x1_0000)
    }

    pub fn read_word(&self, addr: u16) -> Option<u16> {
        let off = addr.checked_sub(self.base)? as usize;
        self.words.get(off).copied()
    }
}

/// Reads a raw little-endian word image. `skip` and `len` count words.
pub fn load_raw_bin(path: &Path, base: u16, skip: usize, len: Option<usize>) -> Result<Image> {
    let file = std::fs::read(path)?;
    anyhow::ensure!(file.len() % 2 == 0, "{} has an odd byte count", path.display());
    let words: Vec<u16> = file
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    anyhow::ensure!(skip <= words.len(), "--skip exceeds file size");
    let mut payload = &words[skip..];
    if let Some(lim) = len {
        anyhow::ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }
    let room = 0x1_0000 - base as usize;
    anyhow::ensure!(payload.len() <= room, "image does not fit above {base:#06x}");
    Ok(Image {
        base,
        words: payload.to_vec(),
    })
}

pub fn save_raw_bin(path: &Path, words: &[u16]) -> Result<()> {
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_maps_skip_and_len() {
        let path = std::env::temp_dir().join("_deep16_model_test.bin");
        save_raw_bin(&path, &[0x0000, 0x1111, 0x2222, 0x3333, 0x4444]).unwrap();
        let img = load_raw_bin(&path, 0x0100, 1, Some(3)).unwrap();
        assert_eq!(img.base, 0x0100);
        assert_eq!(img.words, vec![0x1111, 0x2222, 0x3333]);
        assert_eq!(img.end(), 0x0103);
        assert_eq!(img.read_word(0x0102), Some(0x3333));
        assert_eq!(img.read_word(0x0103), None);
        assert_eq!(img.read_word(0x00FF), None);
        assert!(load_raw_bin(&path, 0, 6, None).is_err());
        let _ = std::fs::remove_file(&path);
    }
}

//! Channel label helpers.

use std::collections::HashMap;

/// Raw-to-10/20 label map for the 16-channel speller montage
pub const SPELLER_CHANNELS: [(&str, &str); 16] = [
    ("eeg:1", "Fz"),
    ("eeg:2", "FC3"),
    ("eeg:3", "FC1"),
    ("eeg:4", "FCz"),
    ("eeg:5", "FC2"),
    ("eeg:6", "FC4"),
    ("eeg:7", "C3"),
    ("eeg:8", "C1"),
    ("eeg:9", "Cz"),
    ("eeg:10", "C2"),
    ("eeg:11", "C4"),
    ("eeg:12", "CP3"),
    ("eeg:13", "CP1"),
    ("eeg:14", "CPz"),
    ("eeg:15", "CP2"),
    ("eeg:16", "CP4"),
];

pub fn speller_channel_map() -> HashMap<String, String> {
    SPELLER_CHANNELS
        .iter()
        .map(|(raw, label)| (raw.to_string(), label.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speller_map() {
        let map = speller_channel_map();
        assert_eq!(map.len(), 16);
        assert_eq!(map.get("eeg:9").map(String::as_str), Some("Cz"));
    }
}

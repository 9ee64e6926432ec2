//! Address-prefix assignment by the `MT<k>` trace-filename convention
//! (§4.11): `MT0` opens a group and gets a fresh prefix; `MT<k>`, k>0,
//! inherits the most recently opened `MT0` group's prefix; a name without
//! the `MT` prefix gets its own fresh prefix.

use crate::error::TraceError;
use std::path::Path;

/// A small sequential id identifying the row-region a trace's addresses
/// are confined to. The caller (which knows the configured field widths)
/// is responsible for shifting this into the augmented row bits before
/// OR-ing it into an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix(pub u64);

#[derive(Default)]
pub struct PrefixAssigner {
    next_id: u64,
    last_mt0_prefix: Option<Prefix>,
}

impl PrefixAssigner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns (or looks up) the prefix for a trace file, by its path.
    pub fn assign(&mut self, path: &Path) -> Result<Prefix, TraceError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        match mt_group(name) {
            Some(0) => {
                let prefix = self.fresh();
                self.last_mt0_prefix = Some(prefix);
                Ok(prefix)
            }
            Some(_) => self.last_mt0_prefix.ok_or_else(|| TraceError::Mt0Absent { path: path.to_path_buf() }),
            None => Ok(self.fresh()),
        }
    }

    fn fresh(&mut self) -> Prefix {
        let id = self.next_id;
        self.next_id += 1;
        Prefix(id)
    }
}

/// Parses the `MT<k>` prefix from a trace filename, if present.
fn mt_group(name: &str) -> Option<u64> {
    let rest = name.strip_prefix("MT")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn mt0_opens_a_fresh_group() {
        let mut assigner = PrefixAssigner::new();
        let prefix = assigner.assign(&PathBuf::from("MT0_app.trace")).unwrap();
        assert_eq!(prefix, Prefix(0));
    }

    #[test]
    fn mtk_inherits_the_open_group() {
        let mut assigner = PrefixAssigner::new();
        let mt0 = assigner.assign(&PathBuf::from("MT0_app.trace")).unwrap();
        let mt1 = assigner.assign(&PathBuf::from("MT1_app.trace")).unwrap();
        assert_eq!(mt0, mt1);
    }

    #[test]
    fn mtk_without_mt0_is_an_error() {
        let mut assigner = PrefixAssigner::new();
        let err = assigner.assign(&PathBuf::from("MT1_app.trace")).unwrap_err();
        assert!(matches!(err, TraceError::Mt0Absent { .. }));
    }

    #[test]
    fn plain_names_each_get_a_fresh_prefix() {
        let mut assigner = PrefixAssigner::new();
        let a = assigner.assign(&PathBuf::from("core0.trace")).unwrap();
        let b = assigner.assign(&PathBuf::from("core1.trace")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn two_distinct_mt0_groups_get_distinct_prefixes() {
        let mut assigner = PrefixAssigner::new();
        let g1 = assigner.assign(&PathBuf::from("MT0_a.trace")).unwrap();
        let g1b = assigner.assign(&PathBuf::from("MT1_a.trace")).unwrap();
        let g2 = assigner.assign(&PathBuf::from("MT0_b.trace")).unwrap();
        assert_eq!(g1, g1b);
        assert_ne!(g1, g2);
    }
}

//! Reference (chromosome/contig) name normalization.
//!
//! Converts between the UCSC style (`chr1`, `chrX`, `chrM`) and the
//! Ensembl/NCBI style (`1`, `X`, `MT`) by applying an ordered list of
//! whole-string regular expression substitutions. Names that match none of
//! the patterns pass through unchanged.

use crate::error::Result;
use regex::Regex;
use std::borrow::Cow;

/// A single `pattern → replacement` rewrite.
#[derive(Debug, Clone)]
struct Substitution {
    pattern: Regex,
    replacement: &'static str,
}

impl Substitution {
    fn new(pattern: &str, replacement: &'static str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement,
        })
    }

    #[inline]
    fn apply<'a>(&self, name: Cow<'a, str>) -> Cow<'a, str> {
        let replaced = match self.pattern.replace_all(&name, self.replacement) {
            Cow::Borrowed(_) => None,
            Cow::Owned(s) => Some(s),
        };
        match replaced {
            Some(s) => Cow::Owned(s),
            None => name,
        }
    }
}

/// Rewrites reference names in one direction, fixed at construction.
#[derive(Debug, Clone)]
pub struct ReferenceRenamer {
    add_chr: bool,
    add: Vec<Substitution>,
    remove: Vec<Substitution>,
}

impl ReferenceRenamer {
    /// Create a renamer; `add_chr` selects `add_chr`, otherwise `remove_chr`.
    pub fn new(add_chr: bool) -> Result<Self> {
        Ok(Self {
            add_chr,
            add: vec![
                Substitution::new("^([0-9]+)$", "chr$1")?,
                Substitution::new("^([XYZW])$", "chr$1")?,
                // Character class, not alternation: matches one of c,h,r,M,',',T.
                Substitution::new("^[chrM,MT]$", "chrM")?,
            ],
            remove: vec![
                Substitution::new("([0-9]+)v([0-9]+)", "$1.$2")?,
                Substitution::new("^chrUn_", "")?,
                Substitution::new("^chrM$", "MT")?,
                Substitution::new("^chr", "")?,
            ],
        })
    }

    /// True when this renamer adds the `chr` prefix.
    pub fn adds_chr(&self) -> bool {
        self.add_chr
    }

    /// Add the `chr` prefix to bare numeric, sex and mitochondrial names.
    pub fn add_chr(&self, name: &str) -> String {
        apply_all(&self.add, name)
    }

    /// Remove `chr`/`chrUn_` prefixes and convert versioned contig names.
    pub fn remove_chr(&self, name: &str) -> String {
        apply_all(&self.remove, name)
    }

    /// Rename in the configured direction; an absent name stays absent.
    pub fn rename(&self, name: Option<&str>) -> Option<String> {
        name.map(|n| self.rename_str(n))
    }

    /// Rename a name that is known to be present.
    #[inline]
    pub fn rename_str(&self, name: &str) -> String {
        if self.add_chr {
            self.add_chr(name)
        } else {
            self.remove_chr(name)
        }
    }
}

fn apply_all(substitutions: &[Substitution], name: &str) -> String {
    substitutions
        .iter()
        .fold(Cow::Borrowed(name), |acc, s| s.apply(acc))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_chr_numeric_and_sex() {
        let renamer = ReferenceRenamer::new(true).unwrap();
        assert_eq!(renamer.add_chr("1"), "chr1");
        assert_eq!(renamer.add_chr("22"), "chr22");
        assert_eq!(renamer.add_chr("X"), "chrX");
        assert_eq!(renamer.add_chr("Y"), "chrY");
        assert_eq!(renamer.add_chr("Z"), "chrZ");
        assert_eq!(renamer.add_chr("W"), "chrW");
    }

    #[test]
    fn test_add_chr_mitochondrial_character_class() {
        // Pins the literal `^[chrM,MT]$` behaviour: single characters only.
        let renamer = ReferenceRenamer::new(true).unwrap();
        assert_eq!(renamer.add_chr("M"), "chrM");
        assert_eq!(renamer.add_chr("T"), "chrM");
        assert_eq!(renamer.add_chr("c"), "chrM");
        assert_eq!(renamer.add_chr(","), "chrM");
        assert_eq!(renamer.add_chr("MT"), "MT");
        assert_eq!(renamer.add_chr("chrM"), "chrM");
    }

    #[test]
    fn test_add_chr_passes_through_unmatched() {
        let renamer = ReferenceRenamer::new(true).unwrap();
        assert_eq!(renamer.add_chr("chr1"), "chr1");
        assert_eq!(renamer.add_chr("GL000192.1"), "GL000192.1");
        assert_eq!(renamer.add_chr(""), "");
    }

    #[test]
    fn test_add_chr_idempotent() {
        let renamer = ReferenceRenamer::new(true).unwrap();
        for name in ["1", "X", "M", "GL000192.1", "chr7"] {
            let once = renamer.add_chr(name);
            assert_eq!(renamer.add_chr(&once), once);
        }
    }

    #[test]
    fn test_remove_chr() {
        let renamer = ReferenceRenamer::new(false).unwrap();
        assert_eq!(renamer.remove_chr("chr1"), "1");
        assert_eq!(renamer.remove_chr("chrX"), "X");
        assert_eq!(renamer.remove_chr("chrM"), "MT");
        assert_eq!(renamer.remove_chr("chrUn_GL000"), "GL000");
        assert_eq!(renamer.remove_chr("123v1"), "123.1");
    }

    #[test]
    fn test_remove_chr_versioned_contigs() {
        let renamer = ReferenceRenamer::new(false).unwrap();
        assert_eq!(renamer.remove_chr("chrUn_KI270302v1"), "KI270302.1");
        assert_eq!(
            renamer.remove_chr("chr1_KI270706v1_random"),
            "1_KI270706.1_random"
        );
    }

    #[test]
    fn test_remove_chr_idempotent() {
        let renamer = ReferenceRenamer::new(false).unwrap();
        for name in ["chr1", "chrM", "chrUn_GL000", "MT", "17"] {
            let once = renamer.remove_chr(name);
            assert_eq!(renamer.remove_chr(&once), once);
        }
    }

    #[test]
    fn test_rename_dispatch() {
        let add = ReferenceRenamer::new(true).unwrap();
        let remove = ReferenceRenamer::new(false).unwrap();
        assert!(add.adds_chr());
        assert_eq!(add.rename(Some("1")), Some("chr1".to_string()));
        assert_eq!(remove.rename(Some("chr1")), Some("1".to_string()));
        assert_eq!(add.rename(None), None);
        assert_eq!(remove.rename(None), None);
    }
}

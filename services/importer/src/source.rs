//! The three registry extracts the importer knows about.

use std::fmt;

use serde::Serialize;

/// Identifies one external extract.
///
/// JAR is the primary source: it defines which companies exist. PVM and
/// Capital only enrich rows that JAR already produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Jar,
    Pvm,
    Capital,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Jar, SourceKind::Pvm, SourceKind::Capital];

    /// Key in the `settings` table holding this source's download URL.
    pub fn setting_key(self) -> &'static str {
        match self {
            SourceKind::Jar => "jar_url",
            SourceKind::Pvm => "pvm_url",
            SourceKind::Capital => "capital_url",
        }
    }

    /// Fixed file name inside the data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            SourceKind::Jar => "JAR_IREGISTRUOTI.csv",
            SourceKind::Pvm => "PVM_MOKETOJAI.csv",
            SourceKind::Capital => "JAR_KAPITALAS.csv",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SourceKind::Jar => "JAR company register",
            SourceKind::Pvm => "PVM payer register",
            SourceKind::Capital => "authorized capital register",
        }
    }

    pub fn is_primary(self) -> bool {
        matches!(self, SourceKind::Jar)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            SourceKind::Jar => "jar",
            SourceKind::Pvm => "pvm",
            SourceKind::Capital => "capital",
        };
        f.write_str(id)
    }
}

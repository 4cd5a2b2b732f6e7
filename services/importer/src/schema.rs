//! Schema reconciliation for registry extracts.
//!
//! The registry republishes its CSV extracts with varying delimiters and
//! header spellings. Each source kind carries a static table of candidate
//! delimiters and, per canonical field, an ordered list of header rules.
//! The first rule matching an unclaimed header wins; fields whose rules match
//! nothing are left out, unless the field is required for that source.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use csv::StringRecord;
use encoding_rs::WINDOWS_1257;
use sha2::{Digest, Sha256};

use crate::error::SchemaError;
use crate::model::{CapitalRecord, JarRecord, PvmRecord};
use crate::source::SourceKind;

/// Canonical field names, independent of source header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Code,
    Name,
    Address,
    RegistrationDate,
    LegalFormCode,
    LegalFormName,
    StatusCode,
    StatusName,
    StatusDateFrom,
    DataUpdatedAt,
    PvmCode,
    PvmDate,
    CapitalAmount,
    CapitalCurrency,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Code => "code",
            Field::Name => "name",
            Field::Address => "address",
            Field::RegistrationDate => "registration_date",
            Field::LegalFormCode => "legal_form_code",
            Field::LegalFormName => "legal_form_name",
            Field::StatusCode => "status_code",
            Field::StatusName => "status_name",
            Field::StatusDateFrom => "status_date_from",
            Field::DataUpdatedAt => "data_updated_at",
            Field::PvmCode => "pvm_code",
            Field::PvmDate => "pvm_date",
            Field::CapitalAmount => "authorized_capital",
            Field::CapitalCurrency => "capital_currency",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a normalized header is recognised.
#[derive(Debug)]
pub enum HeaderRule {
    /// Header equals the synonym.
    Exact(&'static str),
    /// Header contains every `all` substring and none of the `none` substrings.
    Contains {
        all: &'static [&'static str],
        none: &'static [&'static str],
    },
}

impl HeaderRule {
    pub fn matches(&self, header: &str) -> bool {
        match self {
            HeaderRule::Exact(name) => header == *name,
            HeaderRule::Contains { all, none } => {
                all.iter().all(|s| header.contains(s)) && !none.iter().any(|s| header.contains(s))
            }
        }
    }
}

#[derive(Debug)]
pub struct FieldRule {
    pub field: Field,
    pub required: bool,
    pub headers: &'static [HeaderRule],
}

#[derive(Debug)]
pub struct SourceSchema {
    pub kind: SourceKind,
    pub delimiters: &'static [u8],
    pub fields: &'static [FieldRule],
}

use HeaderRule::{Contains, Exact};

pub static JAR_SCHEMA: SourceSchema = SourceSchema {
    kind: SourceKind::Jar,
    delimiters: b"|,;",
    fields: &[
        FieldRule {
            field: Field::Code,
            required: true,
            headers: &[Exact("ja_kodas"), Exact("jar_kodas"), Exact("kodas"), Exact("code")],
        },
        FieldRule {
            field: Field::Name,
            required: true,
            headers: &[Exact("ja_pavadinimas"), Exact("pavadinimas"), Exact("name")],
        },
        FieldRule {
            field: Field::Address,
            required: false,
            headers: &[Exact("adresas"), Exact("ja_adresas"), Exact("address")],
        },
        FieldRule {
            field: Field::RegistrationDate,
            required: false,
            headers: &[
                Exact("ja_reg_data"),
                Exact("reg_data"),
                Exact("iregistravimo_data"),
            ],
        },
        FieldRule {
            field: Field::LegalFormCode,
            required: false,
            headers: &[Exact("form_kodas"), Exact("forma_kodas")],
        },
        FieldRule {
            field: Field::LegalFormName,
            required: false,
            headers: &[Exact("form_pavadinimas"), Exact("forma_pavadinimas")],
        },
        FieldRule {
            field: Field::StatusCode,
            required: false,
            headers: &[Exact("stat_kodas"), Exact("statuso_kodas")],
        },
        FieldRule {
            field: Field::StatusName,
            required: false,
            headers: &[Exact("stat_pavadinimas"), Exact("statuso_pavadinimas")],
        },
        FieldRule {
            field: Field::StatusDateFrom,
            required: false,
            headers: &[Exact("stat_data_nuo"), Exact("statuso_data_nuo")],
        },
        FieldRule {
            field: Field::DataUpdatedAt,
            required: false,
            headers: &[Exact("formavimo_data"), Exact("duomenu_data")],
        },
    ],
};

pub static PVM_SCHEMA: SourceSchema = SourceSchema {
    kind: SourceKind::Pvm,
    delimiters: b",;|",
    fields: &[
        FieldRule {
            field: Field::Code,
            required: true,
            headers: &[
                Exact("ja_kodas"),
                Exact("kodas"),
                Contains { all: &["kodas"], none: &["pvm"] },
            ],
        },
        FieldRule {
            field: Field::PvmCode,
            required: true,
            headers: &[
                Exact("pvm_kodas"),
                Contains { all: &["pvm", "kodas"], none: &[] },
            ],
        },
        FieldRule {
            field: Field::PvmDate,
            required: false,
            headers: &[
                Exact("pvm_iregistravimo_data"),
                Exact("iregistravimo_data"),
                Exact("pvm_reg_data"),
                Exact("reg_data"),
                Contains { all: &["iregistr"], none: &["isregistr"] },
            ],
        },
    ],
};

pub static CAPITAL_SCHEMA: SourceSchema = SourceSchema {
    kind: SourceKind::Capital,
    delimiters: b"|,;",
    fields: &[
        FieldRule {
            field: Field::Code,
            required: true,
            headers: &[
                Exact("ja_kodas"),
                Exact("kodas"),
                Exact("code"),
                Contains { all: &["kodas"], none: &["valiut", "pvm"] },
            ],
        },
        FieldRule {
            field: Field::CapitalAmount,
            required: true,
            headers: &[
                Exact("istatinis_kapitalas"),
                Exact("kapitalas"),
                Exact("kapitalo_dydis"),
                Exact("suma"),
                Exact("authorized_capital"),
                Exact("capital"),
                Contains { all: &["kapital"], none: &["valiut"] },
            ],
        },
        FieldRule {
            field: Field::CapitalCurrency,
            required: false,
            headers: &[
                Exact("valiuta"),
                Exact("kapitalo_valiuta"),
                Exact("currency"),
                Contains { all: &["valiut"], none: &[] },
            ],
        },
    ],
};

pub fn schema_for(kind: SourceKind) -> &'static SourceSchema {
    match kind {
        SourceKind::Jar => &JAR_SCHEMA,
        SourceKind::Pvm => &PVM_SCHEMA,
        SourceKind::Capital => &CAPITAL_SCHEMA,
    }
}

/// Lowercases, folds Lithuanian diacritics, trims and joins inner
/// whitespace or hyphens with `_`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim_matches(|c: char| c == '\u{feff}' || c == '"' || c.is_whitespace())
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ą' => 'a',
            'č' => 'c',
            'ę' | 'ė' => 'e',
            'į' => 'i',
            'š' => 's',
            'ų' | 'ū' => 'u',
            'ž' => 'z',
            '-' => ' ',
            other => other,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

// =============================================================================
// Raw file loading
// =============================================================================

/// File content of one extract, decoded to text.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub kind: SourceKind,
    pub text: String,
    pub sha256: String,
}

impl RawSource {
    pub fn from_bytes(kind: SourceKind, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self {
            kind,
            text: decode(bytes),
            sha256: format!("sha256:{:x}", hasher.finalize()),
        }
    }

    pub async fn load(kind: SourceKind, path: &Path) -> Result<Self, SchemaError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Self::from_bytes(kind, &bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => Err(SchemaError::Missing {
                kind,
                path: path.to_path_buf(),
            }),
            Err(error) => Err(SchemaError::Io {
                path: path.to_path_buf(),
                error,
            }),
        }
    }
}

/// UTF-8 with the BOM stripped; anything else is read as Windows-1257.
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => WINDOWS_1257.decode_without_bom_handling(bytes).0.into_owned(),
    }
}

// =============================================================================
// Tabular view
// =============================================================================

/// Raw rows of one extract with its normalized header row.
#[derive(Debug)]
pub struct SourceDataset {
    pub kind: SourceKind,
    pub delimiter: u8,
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
    pub malformed_rows: usize,
}

/// First candidate delimiter that splits the header row into more than one column.
pub fn detect_delimiter(text: &str, candidates: &[u8]) -> Option<u8> {
    candidates.iter().copied().find(|&delimiter| {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        matches!(reader.records().next(), Some(Ok(header)) if header.len() > 1)
    })
}

pub fn read_dataset(raw: &RawSource) -> Result<SourceDataset, SchemaError> {
    let schema = schema_for(raw.kind);
    if raw.text.trim().is_empty() {
        return Err(SchemaError::Empty(raw.kind));
    }

    let delimiter =
        detect_delimiter(&raw.text, schema.delimiters).ok_or(SchemaError::NoDelimiter(raw.kind))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|error| SchemaError::Csv {
            kind: raw.kind,
            error,
        })?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    let mut malformed_rows = 0;
    for result in reader.records() {
        match result {
            Ok(record) => rows.push(record),
            Err(error) => {
                malformed_rows += 1;
                tracing::debug!(source = %raw.kind, %error, "skipping malformed row");
            }
        }
    }

    Ok(SourceDataset {
        kind: raw.kind,
        delimiter,
        headers,
        rows,
        malformed_rows,
    })
}

// =============================================================================
// Column mapping
// =============================================================================

/// Resolved position of each canonical field present in a dataset.
#[derive(Debug, Default)]
pub struct ColumnMap {
    columns: HashMap<Field, usize>,
    order: Vec<Field>,
}

impl ColumnMap {
    pub fn resolve(schema: &SourceSchema, headers: &[String]) -> Result<Self, SchemaError> {
        let mut claimed = vec![false; headers.len()];
        let mut map = ColumnMap::default();

        for rule in schema.fields {
            let position = rule.headers.iter().find_map(|header_rule| {
                headers
                    .iter()
                    .enumerate()
                    .find(|(idx, header)| !claimed[*idx] && header_rule.matches(header))
                    .map(|(idx, _)| idx)
            });

            match position {
                Some(idx) => {
                    claimed[idx] = true;
                    map.columns.insert(rule.field, idx);
                    map.order.push(rule.field);
                }
                None if rule.required => {
                    return Err(SchemaError::MissingColumn {
                        kind: schema.kind,
                        field: rule.field,
                        headers: headers.to_vec(),
                    });
                }
                None => {}
            }
        }

        Ok(map)
    }

    pub fn index(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Fields found, in schema order.
    pub fn fields(&self) -> &[Field] {
        &self.order
    }

    /// Trimmed cell value; empty cells and absent columns are `None`.
    pub fn value(&self, row: &StringRecord, field: Field) -> Option<String> {
        let value = row.get(self.index(field)?)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

// =============================================================================
// Canonical records
// =============================================================================

/// A fixed-shape record that can be built from a reconciled row.
pub trait SourceRecord: Sized {
    const KIND: SourceKind;

    /// `None` when the row has no join key.
    fn from_row(columns: &ColumnMap, row: &StringRecord) -> Option<Self>;
}

impl SourceRecord for JarRecord {
    const KIND: SourceKind = SourceKind::Jar;

    fn from_row(columns: &ColumnMap, row: &StringRecord) -> Option<Self> {
        Some(JarRecord {
            code: columns.value(row, Field::Code)?,
            name: columns.value(row, Field::Name),
            address: columns.value(row, Field::Address),
            registration_date: columns.value(row, Field::RegistrationDate),
            legal_form_code: columns.value(row, Field::LegalFormCode),
            legal_form_name: columns.value(row, Field::LegalFormName),
            status_code: columns.value(row, Field::StatusCode),
            status_name: columns.value(row, Field::StatusName),
            status_date_from: columns.value(row, Field::StatusDateFrom),
            data_updated_at: columns.value(row, Field::DataUpdatedAt),
        })
    }
}

impl SourceRecord for PvmRecord {
    const KIND: SourceKind = SourceKind::Pvm;

    fn from_row(columns: &ColumnMap, row: &StringRecord) -> Option<Self> {
        Some(PvmRecord {
            code: columns.value(row, Field::Code)?,
            pvm_code: columns.value(row, Field::PvmCode),
            pvm_date: columns.value(row, Field::PvmDate),
        })
    }
}

impl SourceRecord for CapitalRecord {
    const KIND: SourceKind = SourceKind::Capital;

    fn from_row(columns: &ColumnMap, row: &StringRecord) -> Option<Self> {
        Some(CapitalRecord {
            code: columns.value(row, Field::Code)?,
            amount: columns.value(row, Field::CapitalAmount),
            currency: columns.value(row, Field::CapitalCurrency),
        })
    }
}

/// Records of one source after reconciliation.
#[derive(Debug)]
pub struct Reconciled<T> {
    pub records: Vec<T>,
    pub fields: Vec<Field>,
    pub delimiter: u8,
    pub skipped_rows: usize,
}

pub fn reconcile<T: SourceRecord>(raw: &RawSource) -> Result<Reconciled<T>, SchemaError> {
    debug_assert_eq!(raw.kind, T::KIND);
    let dataset = read_dataset(raw)?;
    let columns = ColumnMap::resolve(schema_for(T::KIND), &dataset.headers)?;

    let mut skipped_rows = dataset.malformed_rows;
    let mut records = Vec::with_capacity(dataset.rows.len());
    for row in &dataset.rows {
        match T::from_row(&columns, row) {
            Some(record) => records.push(record),
            None => skipped_rows += 1,
        }
    }

    tracing::info!(
        source = %T::KIND,
        delimiter = %char::from(dataset.delimiter),
        fields = ?columns.fields(),
        rows = records.len(),
        skipped = skipped_rows,
        "reconciled source"
    );

    Ok(Reconciled {
        records,
        fields: columns.fields().to_vec(),
        delimiter: dataset.delimiter,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(kind: SourceKind, text: &str) -> RawSource {
        RawSource::from_bytes(kind, text.as_bytes())
    }

    const JAR_HEADER: &str = "ja_kodas|ja_pavadinimas|adresas|ja_reg_data|form_kodas|form_pavadinimas|stat_kodas|stat_pavadinimas|stat_data_nuo|formavimo_data";

    // -------------------------------------------------------------------------
    // HEADER NORMALIZATION
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_header_case_and_whitespace() {
        assert_eq!(normalize_header("  JA_Kodas "), "ja_kodas");
        assert_eq!(normalize_header("PVM  mokėtojo kodas"), "pvm_moketojo_kodas");
        assert_eq!(normalize_header("Įregistravimo data"), "iregistravimo_data");
        assert_eq!(normalize_header("\u{feff}ja-kodas"), "ja_kodas");
    }

    // -------------------------------------------------------------------------
    // DELIMITER DETECTION
    // -------------------------------------------------------------------------

    #[test]
    fn test_detect_pipe_for_jar() {
        let text = format!("{JAR_HEADER}\n");
        assert_eq!(detect_delimiter(&text, JAR_SCHEMA.delimiters), Some(b'|'));
    }

    #[test]
    fn test_detect_semicolon_when_comma_yields_one_column() {
        let text = "ja_kodas;pvm_kodas\n110001;LT100001\n";
        assert_eq!(detect_delimiter(text, PVM_SCHEMA.delimiters), Some(b';'));
    }

    #[test]
    fn test_detect_none_for_single_column() {
        assert_eq!(detect_delimiter("kodas\n1\n", b"|,;"), None);
    }

    #[test]
    fn test_single_column_file_is_schema_error() {
        let result = reconcile::<PvmRecord>(&raw(SourceKind::Pvm, "kodas\n1\n"));
        assert!(matches!(result, Err(SchemaError::NoDelimiter(SourceKind::Pvm))));
    }

    #[test]
    fn test_empty_file_is_schema_error() {
        let result = reconcile::<JarRecord>(&raw(SourceKind::Jar, "  \n"));
        assert!(matches!(result, Err(SchemaError::Empty(SourceKind::Jar))));
    }

    // -------------------------------------------------------------------------
    // JAR
    // -------------------------------------------------------------------------

    #[test]
    fn test_jar_full_layout() {
        let text = format!(
            "{JAR_HEADER}\n\"110001\"|\"UAB \"\"Alfa\"\"\"|\"Vilnius\"|2001-02-03|310|Uždaroji akcinė bendrovė|0|Teisinis statusas neįregistruotas|2001-02-03|2024-05-01\n"
        );
        let reconciled = reconcile::<JarRecord>(&raw(SourceKind::Jar, &text)).unwrap();

        assert_eq!(reconciled.delimiter, b'|');
        assert_eq!(reconciled.fields.len(), 10);
        assert_eq!(reconciled.records.len(), 1);

        let record = &reconciled.records[0];
        assert_eq!(record.code, "110001");
        assert_eq!(record.name.as_deref(), Some("UAB \"Alfa\""));
        assert_eq!(record.legal_form_code.as_deref(), Some("310"));
        assert_eq!(record.data_updated_at.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn test_jar_missing_optional_columns_are_absent() {
        let text = "ja_kodas|ja_pavadinimas\n110001|Alfa\n";
        let reconciled = reconcile::<JarRecord>(&raw(SourceKind::Jar, text)).unwrap();
        assert_eq!(reconciled.fields, vec![Field::Code, Field::Name]);
        assert_eq!(reconciled.records[0].address, None);
    }

    #[test]
    fn test_jar_missing_name_column_is_schema_error() {
        let text = "ja_kodas|adresas\n110001|Vilnius\n";
        let err = reconcile::<JarRecord>(&raw(SourceKind::Jar, text)).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingColumn {
                field: Field::Name,
                ..
            }
        ));
    }

    #[test]
    fn test_jar_uppercase_headers_with_comma() {
        let text = "JA_KODAS,JA_PAVADINIMAS\n110001,Alfa\n";
        let reconciled = reconcile::<JarRecord>(&raw(SourceKind::Jar, text)).unwrap();
        assert_eq!(reconciled.delimiter, b',');
        assert_eq!(reconciled.records[0].name.as_deref(), Some("Alfa"));
    }

    #[test]
    fn test_rows_without_code_are_skipped() {
        let text = "ja_kodas|ja_pavadinimas\n110001|Alfa\n|Be kodo\n  |Tarpai\n";
        let reconciled = reconcile::<JarRecord>(&raw(SourceKind::Jar, text)).unwrap();
        assert_eq!(reconciled.records.len(), 1);
        assert_eq!(reconciled.skipped_rows, 2);
    }

    #[test]
    fn test_short_rows_yield_missing_values() {
        let text = "ja_kodas|ja_pavadinimas|adresas\n110001|Alfa\n";
        let reconciled = reconcile::<JarRecord>(&raw(SourceKind::Jar, text)).unwrap();
        assert_eq!(reconciled.records[0].address, None);
    }

    // -------------------------------------------------------------------------
    // PVM
    // -------------------------------------------------------------------------

    #[test]
    fn test_pvm_substring_discovery() {
        let text = "Juridinio asmens kodas;PVM mokėtojo kodas;Įregistravimo data\n110001;LT100001;2010-01-01\n";
        let reconciled = reconcile::<PvmRecord>(&raw(SourceKind::Pvm, text)).unwrap();

        assert_eq!(
            reconciled.fields,
            vec![Field::Code, Field::PvmCode, Field::PvmDate]
        );
        let record = &reconciled.records[0];
        assert_eq!(record.code, "110001");
        assert_eq!(record.pvm_code.as_deref(), Some("LT100001"));
        assert_eq!(record.pvm_date.as_deref(), Some("2010-01-01"));
    }

    #[test]
    fn test_pvm_code_column_order_does_not_matter() {
        let text = "pvm_kodas,ja_kodas\nLT100001,110001\n";
        let reconciled = reconcile::<PvmRecord>(&raw(SourceKind::Pvm, text)).unwrap();
        assert_eq!(reconciled.records[0].code, "110001");
        assert_eq!(reconciled.records[0].pvm_code.as_deref(), Some("LT100001"));
    }

    #[test]
    fn test_pvm_without_vat_column_is_schema_error() {
        let text = "ja_kodas,pavadinimas\n110001,Alfa\n";
        let err = reconcile::<PvmRecord>(&raw(SourceKind::Pvm, text)).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingColumn {
                field: Field::PvmCode,
                ..
            }
        ));
    }

    #[test]
    fn test_pvm_deregistration_date_not_taken_as_registration() {
        let text = "kodas,pvm_kodas,isregistravimo_data\n1,LT1,2020-01-01\n";
        let reconciled = reconcile::<PvmRecord>(&raw(SourceKind::Pvm, text)).unwrap();
        assert!(!reconciled.fields.contains(&Field::PvmDate));
    }

    // -------------------------------------------------------------------------
    // CAPITAL
    // -------------------------------------------------------------------------

    #[test]
    fn test_capital_header_variants() {
        let text = "ja_kodas|istatinis_kapitalas|valiuta\n110001|2500,00|EUR\n";
        let reconciled = reconcile::<CapitalRecord>(&raw(SourceKind::Capital, text)).unwrap();
        let record = &reconciled.records[0];
        assert_eq!(record.amount.as_deref(), Some("2500,00"));
        assert_eq!(record.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_capital_without_currency_column() {
        let text = "code,capital\n110001,1000\n";
        let reconciled = reconcile::<CapitalRecord>(&raw(SourceKind::Capital, text)).unwrap();
        assert_eq!(reconciled.fields, vec![Field::Code, Field::CapitalAmount]);
        assert_eq!(reconciled.records[0].currency, None);
    }

    #[test]
    fn test_capital_currency_code_column_not_taken_as_join_key() {
        let text = "valiutos_kodas|ja_kodas|kapitalas\nEUR|110001|100\n";
        let reconciled = reconcile::<CapitalRecord>(&raw(SourceKind::Capital, text)).unwrap();
        assert_eq!(reconciled.records[0].code, "110001");
        assert_eq!(reconciled.records[0].currency.as_deref(), Some("EUR"));
    }

    // -------------------------------------------------------------------------
    // ENCODING
    // -------------------------------------------------------------------------

    #[test]
    fn test_utf8_bom_is_stripped() {
        let text = "\u{feff}ja_kodas|ja_pavadinimas\n110001|Alfa\n";
        let reconciled = reconcile::<JarRecord>(&raw(SourceKind::Jar, text)).unwrap();
        assert_eq!(reconciled.records[0].code, "110001");
    }

    #[test]
    fn test_windows_1257_fallback() {
        let text = "ja_kodas|ja_pavadinimas\n110001|Šiaulių žuvis\n";
        let (bytes, _, had_errors) = WINDOWS_1257.encode(text);
        assert!(!had_errors);
        assert!(std::str::from_utf8(&bytes).is_err());

        let source = RawSource::from_bytes(SourceKind::Jar, &bytes);
        let reconciled = reconcile::<JarRecord>(&source).unwrap();
        assert_eq!(reconciled.records[0].name.as_deref(), Some("Šiaulių žuvis"));
    }

    #[test]
    fn test_hash_is_stable() {
        let a = raw(SourceKind::Jar, "ja_kodas|ja_pavadinimas\n1|A\n");
        let b = raw(SourceKind::Jar, "ja_kodas|ja_pavadinimas\n1|A\n");
        assert_eq!(a.sha256, b.sha256);
        assert!(a.sha256.starts_with("sha256:"));
    }
}

//! Row shapes flowing through the pipeline.
//!
//! Source records keep raw, trimmed strings exactly as the extract carried
//! them. Only [`CompanyRecord`] holds typed values.

use chrono::NaiveDate;
use serde::Serialize;

/// One row of the JAR extract mapped onto canonical fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JarRecord {
    pub code: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub registration_date: Option<String>,
    pub legal_form_code: Option<String>,
    pub legal_form_name: Option<String>,
    pub status_code: Option<String>,
    pub status_name: Option<String>,
    pub status_date_from: Option<String>,
    pub data_updated_at: Option<String>,
}

/// One row of the VAT payer extract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PvmRecord {
    pub code: String,
    pub pvm_code: Option<String>,
    pub pvm_date: Option<String>,
}

/// One row of the authorized capital extract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapitalRecord {
    pub code: String,
    pub amount: Option<String>,
    pub currency: Option<String>,
}

/// A JAR row with whatever enrichment matched its code.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub jar: JarRecord,
    pub pvm: Option<PvmRecord>,
    pub capital: Option<CapitalRecord>,
}

/// A published row of the `companies` table.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CompanyRecord {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub legal_form_code: Option<i64>,
    pub legal_form_name: Option<String>,
    pub status_code: Option<i64>,
    pub status_name: Option<String>,
    pub status_date_from: Option<NaiveDate>,
    pub data_updated_at: Option<NaiveDate>,
    pub pvm_code: Option<String>,
    pub pvm_date: Option<NaiveDate>,
    pub authorized_capital: Option<f64>,
    pub capital_currency: Option<String>,
}

impl CompanyRecord {
    /// True when no secondary source contributed to this row.
    pub fn has_no_enrichment(&self) -> bool {
        self.pvm_code.is_none()
            && self.pvm_date.is_none()
            && self.authorized_capital.is_none()
            && self.capital_currency.is_none()
    }
}

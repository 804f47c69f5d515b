//! Domain types: roster, reporting window, raw records and datasets.

pub mod dataset;
pub mod fields;
pub mod record;
pub mod roster;
pub mod window;

pub use dataset::RawDataset;
pub use fields::{financial_field_list, FieldCode, PeriodFields};
pub use record::{safe_float, safe_numeric, InstitutionRecord, RawPeriodRecord, RawRecord};
pub use roster::{BusinessMix, EntityLookup, Roster, RosterEntry, SizeTier};
pub use window::{parse_report_date, DateWindow, REPORT_DATE_FORMAT};

//! Self-contained HTML reports for AVALIA+.

pub mod html;

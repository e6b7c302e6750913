//! Workbook fixtures for reader and registry tests.

use rust_xlsxwriter::Workbook;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    Text(&'a str),
    Num(f64),
    Bool(bool),
    Blank,
}

/// Write an xlsx file with one sheet per `(name, rows)`; the first row is the header.
pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Cell<'_>>>)]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match *cell {
                    Cell::Text(s) => {
                        sheet.write_string(r, c, s).unwrap();
                    }
                    Cell::Num(n) => {
                        sheet.write_number(r, c, n).unwrap();
                    }
                    Cell::Bool(b) => {
                        sheet.write_boolean(r, c, b).unwrap();
                    }
                    Cell::Blank => {}
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

/// Two-sheet report: `Campaigns` first, then `Devices`.
pub fn write_report(path: &Path) {
    use Cell::*;
    write_workbook(
        path,
        &[
            (
                "Campaigns",
                vec![
                    vec![Text("Campaign Name"), Text("Clicks"), Text("CTR"), Text("Cost")],
                    vec![Text("Brand"), Num(120.0), Num(0.05), Num(40.5)],
                    vec![Text("Generic"), Text("N/A"), Blank, Num(12.0)],
                    vec![Text("Retargeting"), Num(7.0), Num(0.02), Bool(true)],
                ],
            ),
            (
                "Devices",
                vec![
                    vec![Text("Device"), Text("Clicks")],
                    vec![Text("Mobile"), Num(80.0)],
                ],
            ),
        ],
    );
}

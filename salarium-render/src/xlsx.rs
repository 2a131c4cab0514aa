//! Minimal Office Open XML workbook writer
//!
//! Builds `.xlsx` packages in memory: a zip container holding the workbook,
//! one XML part per worksheet and a fixed stylesheet. Strings are written
//! inline so no shared-string table is needed.
//!
//! ```ignore
//! let mut wb = Workbook::new();
//! let sheet = wb.add_worksheet("Summary");
//! sheet.write_string(0, 0, "Gross", CellStyle::TableHeader);
//! sheet.write_number(0, 1, 1500.0, CellStyle::Currency);
//! let bytes = wb.save_to_buffer()?;
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use tracing::instrument;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::{RenderError, RenderResult};

/// Currency cell format
pub const CURRENCY_FORMAT: &str = "#,##0.00";
/// Percentage cell format (value stored as a fraction)
pub const PERCENT_FORMAT: &str = "0.0%";

const MAX_SHEET_NAME_LEN: usize = 31;

/// Cell styles, indexes into `cellXfs` of the stylesheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CellStyle {
    Default = 0,
    /// Large white bold text on the dark banner fill
    Title = 1,
    Subtitle = 2,
    /// Section banner (white bold on dark fill)
    Banner = 3,
    TableHeader = 4,
    Text = 5,
    Currency = 6,
    Percent = 7,
    Count = 8,
    TotalText = 9,
    TotalCurrency = 10,
    TotalPercent = 11,
    TotalCount = 12,
    KpiLabel = 13,
    KpiCurrency = 14,
    KpiPercent = 15,
    KpiCount = 16,
}

impl CellStyle {
    fn xf_index(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

/// One worksheet; rows and columns are zero-based
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    merges: Vec<(u32, u16, u32, u16)>,
    col_widths: BTreeMap<u16, f64>,
    row_heights: BTreeMap<u32, f64>,
    landscape: bool,
}

impl Worksheet {
    fn new(name: &str) -> Self {
        let name: String = name
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
            .take(MAX_SHEET_NAME_LEN)
            .collect();
        Self {
            name,
            cells: BTreeMap::new(),
            merges: Vec::new(),
            col_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            landscape: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write_string(&mut self, row: u32, col: u16, text: &str, style: CellStyle) -> &mut Self {
        self.cells.insert(
            (row, col),
            Cell {
                value: CellValue::Text(text.to_string()),
                style,
            },
        );
        self
    }

    pub fn write_number(&mut self, row: u32, col: u16, value: f64, style: CellStyle) -> &mut Self {
        self.cells.insert(
            (row, col),
            Cell {
                value: CellValue::Number(value),
                style,
            },
        );
        self
    }

    /// Style a cell without giving it a value (e.g. banner fill)
    pub fn write_blank(&mut self, row: u32, col: u16, style: CellStyle) -> &mut Self {
        self.write_string(row, col, "", style)
    }

    /// Merge a range and write `text` into its top-left cell
    ///
    /// The other cells of the range carry the same style so fills and
    /// borders span the merged area.
    pub fn merge_range(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        text: &str,
        style: CellStyle,
    ) -> &mut Self {
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                self.write_blank(row, col, style);
            }
        }
        self.write_string(first_row, first_col, text, style);
        self.merges.push((first_row, first_col, last_row, last_col));
        self
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) -> &mut Self {
        self.col_widths.insert(col, width);
        self
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) -> &mut Self {
        self.row_heights.insert(row, height);
        self
    }

    pub fn set_landscape(&mut self) -> &mut Self {
        self.landscape = true;
        self
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    fn to_xml(&self) -> RenderResult<String> {
        let mut xml = String::with_capacity(16 * 1024);
        xml.push_str(XML_HEADER);
        xml.push_str(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        xml.push_str(r#"<sheetViews><sheetView workbookViewId="0" showGridLines="0"/></sheetViews>"#);
        xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);

        if !self.col_widths.is_empty() {
            xml.push_str("<cols>");
            for (col, width) in &self.col_widths {
                let n = col + 1;
                write_fmt(
                    &mut xml,
                    format_args!(r#"<col min="{n}" max="{n}" width="{width}" customWidth="1"/>"#),
                )?;
            }
            xml.push_str("</cols>");
        }

        xml.push_str("<sheetData>");
        let rows: BTreeSet<u32> = self
            .cells
            .keys()
            .map(|(r, _)| *r)
            .chain(self.row_heights.keys().copied())
            .collect();
        for row in rows {
            let r = row + 1;
            match self.row_heights.get(&row) {
                Some(ht) => write_fmt(
                    &mut xml,
                    format_args!(r#"<row r="{r}" ht="{ht}" customHeight="1">"#),
                )?,
                None => write_fmt(&mut xml, format_args!(r#"<row r="{r}">"#))?,
            }
            for ((_, col), cell) in self.cells.range((row, 0)..=(row, u16::MAX)) {
                let reference = cell_ref(row, *col);
                let s = cell.style.xf_index();
                match &cell.value {
                    CellValue::Text(text) if text.is_empty() => {
                        write_fmt(&mut xml, format_args!(r#"<c r="{reference}" s="{s}"/>"#))?
                    }
                    CellValue::Text(text) => write_fmt(
                        &mut xml,
                        format_args!(
                            r#"<c r="{reference}" s="{s}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                            escape(&sanitize(text))
                        ),
                    )?,
                    CellValue::Number(value) if value.is_finite() => write_fmt(
                        &mut xml,
                        format_args!(r#"<c r="{reference}" s="{s}"><v>{value}</v></c>"#),
                    )?,
                    CellValue::Number(value) => {
                        return Err(RenderError::Layout(format!(
                            "non-finite value {} in cell {}!{}",
                            value, self.name, reference
                        )));
                    }
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData>");

        if !self.merges.is_empty() {
            write_fmt(&mut xml, format_args!(r#"<mergeCells count="{}">"#, self.merges.len()))?;
            for (r1, c1, r2, c2) in &self.merges {
                write_fmt(
                    &mut xml,
                    format_args!(r#"<mergeCell ref="{}:{}"/>"#, cell_ref(*r1, *c1), cell_ref(*r2, *c2)),
                )?;
            }
            xml.push_str("</mergeCells>");
        }

        xml.push_str(r#"<pageMargins left="0.5" right="0.5" top="0.6" bottom="0.6" header="0.3" footer="0.3"/>"#);
        if self.landscape {
            xml.push_str(r#"<pageSetup paperSize="9" orientation="landscape"/>"#);
        }
        xml.push_str("</worksheet>");
        Ok(xml)
    }
}

/// Workbook builder
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    title: Option<String>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document title stored in the package core properties
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn add_worksheet(&mut self, name: &str) -> &mut Worksheet {
        self.sheets.push(Worksheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn worksheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    /// Assemble the zip package
    #[instrument(skip(self), fields(sheets = self.sheets.len()))]
    pub fn save_to_buffer(&self) -> RenderResult<Vec<u8>> {
        if self.sheets.is_empty() {
            return Err(RenderError::Layout("workbook has no worksheets".to_string()));
        }

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types_xml().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS_XML.as_bytes())?;

        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(self.core_xml().as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(self.workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(self.workbook_rels_xml().as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(STYLES_XML.as_bytes())?;

        for (i, sheet) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(sheet.to_xml()?.as_bytes())?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::from(XML_HEADER);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
        }
        xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
        xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
        xml.push_str("</Types>");
        xml
    }

    fn core_xml(&self) -> String {
        let title = self.title.as_deref().unwrap_or_default();
        format!(
            r#"{XML_HEADER}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title><dc:creator>Salarium</dc:creator></cp:coreProperties>"#,
            escape(&sanitize(title))
        )
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(XML_HEADER);
        xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#);
        for (i, sheet) in self.sheets.iter().enumerate() {
            let id = i + 1;
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#,
                escape(sheet.name())
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels_xml(&self) -> String {
        let mut xml = String::from(XML_HEADER);
        xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
            ));
        }
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            self.sheets.len() + 1
        ));
        xml.push_str("</Relationships>");
        xml
    }
}

/// Zero-based column index to letters (0 → A, 26 → AA)
pub fn column_name(col: u16) -> String {
    let mut n = col as u32 + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        name.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Zero-based (row, col) to an A1 reference
pub fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// Drop characters XML 1.0 cannot carry
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

fn write_fmt(xml: &mut String, args: std::fmt::Arguments<'_>) -> RenderResult<()> {
    xml.write_fmt(args)
        .map_err(|e| RenderError::Layout(format!("xml formatting failed: {}", e)))
}

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"</Relationships>"#
);

// Order of <xf> entries must match `CellStyle` discriminants.
const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r##"<numFmts count="2"><numFmt numFmtId="164" formatCode="#,##0.00"/><numFmt numFmtId="165" formatCode="0.0%"/></numFmts>"##,
    r#"<fonts count="5">"#,
    r#"<font><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="16"/><color rgb="FFFFFFFF"/><name val="Calibri"/></font>"#,
    r#"<font><i/><sz val="10"/><color rgb="FF5B6475"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="12"/><color rgb="FFFFFFFF"/><name val="Calibri"/></font>"#,
    r#"</fonts>"#,
    r#"<fills count="5">"#,
    r#"<fill><patternFill patternType="none"/></fill>"#,
    r#"<fill><patternFill patternType="gray125"/></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FF1F3A5F"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FFE7ECF3"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FFF4F6F9"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"</fills>"#,
    r#"<borders count="2">"#,
    r#"<border><left/><right/><top/><bottom/><diagonal/></border>"#,
    r#"<border><left style="thin"><color rgb="FFD0D5DD"/></left><right style="thin"><color rgb="FFD0D5DD"/></right><top style="thin"><color rgb="FFD0D5DD"/></top><bottom style="thin"><color rgb="FFD0D5DD"/></bottom><diagonal/></border>"#,
    r#"</borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="17">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="2" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"><alignment vertical="center"/></xf>"#,
    r#"<xf numFmtId="0" fontId="3" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
    r#"<xf numFmtId="0" fontId="4" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"><alignment vertical="center"/></xf>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="3" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1"><alignment horizontal="center" vertical="center" wrapText="1"/></xf>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="1" xfId="0" applyBorder="1"/>"#,
    r#"<xf numFmtId="164" fontId="0" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="165" fontId="0" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="1" fontId="0" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="4" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="164" fontId="1" fillId="4" borderId="1" xfId="0" applyNumberFormat="1" applyFont="1" applyFill="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="165" fontId="1" fillId="4" borderId="1" xfId="0" applyNumberFormat="1" applyFont="1" applyFill="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="1" fontId="1" fillId="4" borderId="1" xfId="0" applyNumberFormat="1" applyFont="1" applyFill="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="3" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="164" fontId="1" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyFont="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="165" fontId="1" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyFont="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="1" fontId="1" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyFont="1" applyBorder="1"/>"#,
    r#"</cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#
);

//! Export-tjänst: personlistan som Word-dokument (.docx)
//!
//! Dokumentet är ett minimalt WordprocessingML-paket. Det är avsett för
//! utskrift och delning och kan inte läsas in igen.

use anyhow::{Context, Result};
use chrono::Utc;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::db::{Database, FollowUpRepository, PersonRepository};
use crate::models::{FollowUp, Person};
use crate::utils::path::write_atomically;

/// Fast filnamn i dokumentkatalogen
pub const DOCX_FILENAME: &str = "fspal_persons.docx";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// Resultat av export
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub path: PathBuf,
    pub row_count: usize,
    pub follow_up_count: usize,
    pub file_size: u64,
}

impl ExportResult {
    pub fn summary(&self) -> String {
        format!(
            "Personlista exporterad: {} personer, {} uppföljningar, {} bytes",
            self.row_count, self.follow_up_count, self.file_size
        )
    }
}

/// Export-tjänst
pub struct ExportService<'a> {
    db: &'a Database,
}

impl<'a> ExportService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn export_path(documents_dir: &Path) -> PathBuf {
        documents_dir.join(DOCX_FILENAME)
    }

    /// Skriv alla personer till `fspal_persons.docx` i `documents_dir`
    pub fn export_docx(&self, documents_dir: &Path, include_follow_ups: bool) -> Result<ExportResult> {
        let entries = self.db.with_connection(|conn| {
            let mut entries = Vec::new();
            for person in PersonRepository::find_all_with(conn)? {
                let follow_ups = match (include_follow_ups, person.id) {
                    (true, Some(id)) => FollowUpRepository::find_by_person_with(conn, id)?,
                    _ => Vec::new(),
                };
                entries.push((person, follow_ups));
            }
            Ok(entries)
        })?;

        let document = Self::document_xml(&entries, include_follow_ups);
        let bytes = Self::package(&document)?;

        let path = Self::export_path(documents_dir);
        write_atomically(&path, &bytes).context("Kunde inte spara docx")?;

        let result = ExportResult {
            row_count: entries.len(),
            follow_up_count: entries.iter().map(|(_, f)| f.len()).sum(),
            file_size: bytes.len() as u64,
            path,
        };
        info!("{}", result.summary());
        Ok(result)
    }

    /// Packa dokumentet i minnet; filen på disk byts först när allt är klart
    fn package(document: &str) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("word/document.xml", document),
        ] {
            zip.start_file(name, options)?;
            zip.write_all(content.as_bytes())?;
        }

        let cursor = zip.finish().context("Kunde inte packa docx")?;
        Ok(cursor.into_inner())
    }

    fn document_xml(entries: &[(Person, Vec<FollowUp>)], include_follow_ups: bool) -> String {
        let mut body = String::new();

        body.push_str(&Self::paragraph("FS Pal - Personer", true));
        body.push_str(&Self::paragraph(
            &Utc::now().format("Genererad: %Y-%m-%d %H:%M").to_string(),
            false,
        ));

        for (person, follow_ups) in entries {
            body.push_str(&Self::paragraph(&person.display_name(), true));

            let address = person.address();
            if !address.is_empty() {
                body.push_str(&Self::paragraph(&format!("Adress: {}", address), false));
            }
            if let Some(contact) = person.contact.as_deref().filter(|c| !c.trim().is_empty()) {
                body.push_str(&Self::paragraph(&format!("Kontakt: {}", contact), false));
            }
            body.push_str(&Self::paragraph(
                &format!("Kategori: {}", person.category.label()),
                false,
            ));
            if let Some(remarks) = person.remarks.as_deref().filter(|r| !r.trim().is_empty()) {
                body.push_str(&Self::paragraph(&format!("Anmärkningar: {}", remarks), false));
            }

            if include_follow_ups && !follow_ups.is_empty() {
                body.push_str(&Self::paragraph("Uppföljningar:", false));
                for f in follow_ups {
                    body.push_str(&Self::paragraph(
                        &format!("{}: {}", f.date.format("%Y-%m-%d"), f.notes),
                        false,
                    ));
                }
            }
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    fn paragraph(text: &str, bold: bool) -> String {
        let props = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
        format!(
            r#"<w:p><w:r>{}<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            props,
            Self::xml_escape(text)
        )
    }

    fn xml_escape(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                c => escaped.push(c),
            }
        }
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitCategory;
    use chrono::TimeZone;
    use std::fs::File;
    use std::io::Read;

    fn read_entry(path: &Path, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut content = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        let mut anna = Person {
            street: Some("Storgatan 1".into()),
            contact: Some("070-123 45 67".into()),
            category: VisitCategory::ReturnVisit,
            ..Person::new("Anna & <Erik>")
        };
        let id = db.persons().create(&mut anna).unwrap();
        let date = Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap();
        db.follow_ups()
            .create(&mut FollowUp::new(id, date, "Lämnade tidskrift"))
            .unwrap();
        db.persons().create(&mut Person::new("Maria")).unwrap();
        db
    }

    #[test]
    fn test_export_with_follow_ups() {
        let db = seeded();
        let dir = tempfile::tempdir().unwrap();

        let result = ExportService::new(&db).export_docx(dir.path(), true).unwrap();
        assert_eq!(result.path, dir.path().join(DOCX_FILENAME));
        assert_eq!(result.row_count, 2);
        assert_eq!(result.follow_up_count, 1);
        assert!(result.file_size > 0);

        let xml = read_entry(&result.path, "word/document.xml");
        assert!(xml.contains("Anna &amp; &lt;Erik&gt;"));
        assert!(xml.contains("Adress: Storgatan 1"));
        assert!(xml.contains("Kontakt: 070-123 45 67"));
        assert!(xml.contains("2025-03-03: Lämnade tidskrift"));
        assert!(xml.contains("Maria"));

        assert!(read_entry(&result.path, "[Content_Types].xml").contains("word/document.xml"));
        assert!(read_entry(&result.path, "_rels/.rels").contains("officeDocument"));
    }

    #[test]
    fn test_export_without_follow_ups() {
        let db = seeded();
        let dir = tempfile::tempdir().unwrap();

        let result = ExportService::new(&db).export_docx(dir.path(), false).unwrap();
        assert_eq!(result.follow_up_count, 0);

        let xml = read_entry(&result.path, "word/document.xml");
        assert!(!xml.contains("Lämnade tidskrift"));
        assert!(!xml.contains("Uppföljningar"));
    }

    #[test]
    fn test_export_replaces_previous_file_in_one_step() {
        let db = seeded();
        let dir = tempfile::tempdir().unwrap();
        let path = ExportService::export_path(dir.path());
        std::fs::write(&path, b"gammal export").unwrap();

        let result = ExportService::new(&db).export_docx(dir.path(), true).unwrap();
        assert_eq!(result.file_size, std::fs::metadata(&path).unwrap().len());
        assert!(read_entry(&path, "word/document.xml").contains("Maria"));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from(DOCX_FILENAME)]);
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(ExportService::xml_escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
        assert_eq!(ExportService::xml_escape("Åsa"), "Åsa");
    }
}

//! Extractors against real files written to a temporary directory.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use docqa_extract::{
    CsvExtractor, DocxExtractor, PdfExtractor, SpreadsheetExtractor, TextExtractor,
    default_extractors,
};
use docqa_rag::{
    EmbeddingProvider, Extractor, InMemoryIndex, IngestionPipeline, RagConfig, RagError,
    RecordKind, Result,
};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn write_docx(path: &Path, document_xml: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default()).unwrap();
    zip.write_all(document_xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// One page per entry; `None` leaves the page without content.
/// Write an `.xlsx` with inline-string cells. A sheet with `None` rows is
/// listed in the workbook but its part is left out of the archive.
fn write_xlsx(path: &Path, sheets: &[(&str, Option<&[&[&str]]>)]) {
    let options = zip::write::SimpleFileOptions::default();
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);

    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (i, (name, _)) in sheets.iter().enumerate() {
        let n = i + 1;
        workbook.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    workbook.push_str("</sheets></workbook>");
    rels.push_str("</Relationships>");

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#,
    )
    .unwrap();
    zip.start_file("xl/workbook.xml", options).unwrap();
    zip.write_all(workbook.as_bytes()).unwrap();
    zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
    zip.write_all(rels.as_bytes()).unwrap();

    for (i, (_, rows)) in sheets.iter().enumerate() {
        let Some(rows) = rows else { continue };
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (r, cells) in rows.iter().enumerate() {
            xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in cells.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
                let column = char::from(b'A' + u8::try_from(c).unwrap());
                xml.push_str(&format!(
                    r#"<c r="{column}{}" t="inlineStr"><is><t>{value}</t></is></c>"#,
                    r + 1
                ));
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn image_xobject(
    width: i64,
    height: i64,
    filter: &str,
    color_space: &str,
    data: Vec<u8>,
) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => filter,
        },
        data,
    )
}

/// Page 1: text, a 64x64 JPEG, a 10x10 JPEG and a 50x50 Flate gray bitmap.
/// Page 2: only a 20x20 JPEG.
fn write_pdf_with_images(path: &Path, jpeg: &[u8]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut gray = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    gray.write_all(&[128u8; 50 * 50]).unwrap();
    let photo = doc.add_object(image_xobject(64, 64, "DCTDecode", "DeviceRGB", jpeg.to_vec()));
    let icon = doc.add_object(image_xobject(10, 10, "DCTDecode", "DeviceRGB", jpeg.to_vec()));
    let scan = doc.add_object(image_xobject(
        50,
        50,
        "FlateDecode",
        "DeviceGray",
        gray.finish().unwrap(),
    ));
    let thumb = doc.add_object(image_xobject(20, 20, "DCTDecode", "DeviceRGB", jpeg.to_vec()));

    let figures = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal("Figures")]),
            Operation::new("ET", vec![]),
        ],
    };
    let pages = [
        (figures, dictionary! { "Photo" => photo, "Icon" => icon, "Scan" => scan }),
        (Content { operations: Vec::new() }, dictionary! { "Thumb" => thumb }),
    ];

    let mut kids: Vec<Object> = Vec::new();
    for (content, xobjects) in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn write_pdf(path: &Path, pages: &[Option<&str>]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = match text {
            Some(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
            None => Vec::new(),
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[tokio::test]
async fn text_file_is_one_flattened_page() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "notes.txt", "first line\nsecond line\n");

    let document = TextExtractor.extract(&path).await.unwrap();
    assert_eq!(document.pages.len(), 1);
    assert_eq!(document.pages[0].number, 1);
    assert_eq!(document.pages[0].text, "first line second line ");
}

#[tokio::test]
async fn invalid_utf8_text_is_an_extraction_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "latin1.txt", [0x63, 0x61, 0x66, 0xE9]);

    let err = TextExtractor.extract(&path).await.unwrap_err();
    assert!(matches!(err, RagError::ExtractionError { .. }));
}

#[tokio::test]
async fn missing_files_are_not_found() {
    let dir = TempDir::new().unwrap();
    let cases: Vec<(Arc<dyn Extractor>, &str)> = vec![
        (Arc::new(TextExtractor), "a.txt"),
        (Arc::new(DocxExtractor), "a.docx"),
        (Arc::new(CsvExtractor), "a.csv"),
        (Arc::new(SpreadsheetExtractor), "a.xlsx"),
        (Arc::new(PdfExtractor::new()), "a.pdf"),
    ];
    for (extractor, name) in cases {
        let err = extractor.extract(&dir.path().join(name)).await.unwrap_err();
        assert!(matches!(err, RagError::NotFound(_)), "{name}: {err}");
    }
}

#[tokio::test]
async fn docx_text_runs_become_page_one() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memo.docx");
    write_docx(
        &path,
        "<w:document><w:body>\
         <w:p><w:r><w:t>Quarterly memo</w:t></w:r></w:p>\
         <w:p><w:r><w:t>Revenue grew &amp; costs fell.</w:t></w:r></w:p>\
         </w:body></w:document>",
    );

    let document = DocxExtractor.extract(&path).await.unwrap();
    assert_eq!(document.pages.len(), 1);
    assert_eq!(document.pages[0].text, "Quarterly memo Revenue grew & costs fell.");
}

#[tokio::test]
async fn docx_without_body_is_an_extraction_error() {
    let dir = TempDir::new().unwrap();
    let not_a_zip = write(&dir, "fake.docx", "plain text");
    let err = DocxExtractor.extract(&not_a_zip).await.unwrap_err();
    assert!(matches!(err, RagError::ExtractionError { .. }));

    let path = dir.path().join("empty.docx");
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("docProps/app.xml", zip::write::SimpleFileOptions::default()).unwrap();
    zip.write_all(b"<Properties/>").unwrap();
    zip.finish().unwrap();

    let err = DocxExtractor.extract(&path).await.unwrap_err();
    assert!(matches!(err, RagError::ExtractionError { .. }));
}

#[tokio::test]
async fn csv_rows_become_numbered_pages() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "people.csv", "name,city\nAda,London\n,\nGrace,\n");

    let document = CsvExtractor.extract(&path).await.unwrap();
    let pages: Vec<(u32, &str)> =
        document.pages.iter().map(|p| (p.number, p.text.as_str())).collect();
    assert_eq!(pages, vec![(1, "name: Ada, city: London"), (3, "name: Grace")]);
}

#[tokio::test]
async fn undecodable_csv_row_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "people.csv", b"name,city\nAda,London\nBob,\xff\xfe\nCy,Paris\n");

    let document = CsvExtractor.extract(&path).await.unwrap();
    let pages: Vec<(u32, &str)> =
        document.pages.iter().map(|p| (p.number, p.text.as_str())).collect();
    assert_eq!(pages, vec![(1, "name: Ada, city: London"), (3, "name: Cy, city: Paris")]);
}

#[tokio::test]
async fn workbook_rows_are_numbered_across_sheets() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inventory.xlsx");
    let people: &[&[&str]] = &[&["name", "city"], &["Ada", "London"], &["Grace", ""]];
    let pets: &[&[&str]] = &[&["pet"], &["Rex"]];
    write_xlsx(&path, &[("People", Some(people)), ("Pets", Some(pets))]);

    let document = SpreadsheetExtractor.extract(&path).await.unwrap();
    let pages: Vec<(u32, &str)> =
        document.pages.iter().map(|p| (p.number, p.text.as_str())).collect();
    assert_eq!(
        pages,
        vec![(1, "name: Ada, city: London"), (2, "name: Grace"), (3, "pet: Rex")]
    );
}

#[tokio::test]
async fn unreadable_sheet_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.xlsx");
    let pets: &[&[&str]] = &[&["pet"], &["Rex"], &["Tom"]];
    write_xlsx(&path, &[("Lost", None), ("Pets", Some(pets))]);

    let document = SpreadsheetExtractor.extract(&path).await.unwrap();
    let pages: Vec<(u32, &str)> =
        document.pages.iter().map(|p| (p.number, p.text.as_str())).collect();
    assert_eq!(pages, vec![(1, "pet: Rex"), (2, "pet: Tom")]);
}

#[tokio::test]
async fn garbage_spreadsheet_is_an_extraction_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "report.xlsx", "definitely not a workbook");

    let err = SpreadsheetExtractor.extract(&path).await.unwrap_err();
    assert!(matches!(err, RagError::ExtractionError { .. }));
}

#[tokio::test]
async fn pdf_text_is_read_per_page_and_blank_pages_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.pdf");
    write_pdf(&path, &[Some("Hello World"), None, Some("Third page")]);

    let document = PdfExtractor::new().extract(&path).await.unwrap();
    let numbers: Vec<u32> = document.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 3]);
    assert!(document.pages[0].text.contains("Hello World"));
    assert!(document.pages[1].text.contains("Third page"));
    assert_eq!(document.image_count(), 0);
}

#[tokio::test]
async fn pdf_images_are_decoded_and_small_ones_dropped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("figures.pdf");
    let jpeg = b"\xFF\xD8\xFFfake-jpeg-body";
    write_pdf_with_images(&path, jpeg);

    let document = PdfExtractor::new().extract(&path).await.unwrap();
    assert_eq!(document.pages.len(), 1);
    let page = &document.pages[0];
    assert_eq!(page.number, 1);
    assert!(page.text.contains("Figures"));

    let mut images: Vec<_> = page.images.iter().collect();
    images.sort_by(|a, b| a.extension.cmp(&b.extension));
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].extension, "jpeg");
    assert_eq!(images[0].data, jpeg);
    assert_eq!(images[1].extension, "png");
    let png = image::load_from_memory(&images[1].data).unwrap();
    assert_eq!((png.width(), png.height()), (50, 50));
}

#[tokio::test]
async fn text_only_pdf_extractor_ignores_images() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("figures.pdf");
    write_pdf_with_images(&path, b"\xFF\xD8\xFF");

    let document = PdfExtractor::text_only().extract(&path).await.unwrap();
    assert_eq!(document.image_count(), 0);
    let numbers: Vec<u32> = document.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1]);
}

#[tokio::test]
async fn corrupt_pdf_is_an_extraction_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "broken.pdf", "%PDF-1.5 truncated");

    let err = PdfExtractor::text_only().extract(&path).await.unwrap_err();
    assert!(matches!(err, RagError::ExtractionError { .. }));
}

/// Embeds text by its length; enough to exercise the in-memory index.
struct LengthEmbedder;

#[async_trait]
impl EmbeddingProvider for LengthEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(vec![text.chars().count() as f32, 1.0])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

#[tokio::test]
async fn folder_ingestion_with_default_extractors() {
    let dir = TempDir::new().unwrap();
    write(&dir, "notes.txt", "word ".repeat(120));
    write(&dir, "people.csv", "name,city\nAda,London\nGrace,Arlington\n");
    write(&dir, "slides.pptx", "unsupported");

    let index = Arc::new(InMemoryIndex::new(Arc::new(LengthEmbedder)));
    let config = RagConfig::builder().chunk_size(256).build().unwrap();
    let pipeline = IngestionPipeline::builder()
        .config(config)
        .index(index.clone())
        .extractors(default_extractors())
        .image_dir(dir.path().join("images"))
        .build()
        .unwrap();

    let summary = pipeline.ingest_directory(dir.path()).await.unwrap();
    assert_eq!(summary.files_ingested, 2);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.records_indexed, 5);

    let records = index.records().await;
    let notes: Vec<_> = records.iter().filter(|r| r.metadata.source == "notes.txt").collect();
    assert_eq!(notes.len(), 3);
    assert!(notes.iter().all(|r| r.metadata.page == 1 && r.metadata.kind == RecordKind::Text));

    let rows: Vec<u32> = records
        .iter()
        .filter(|r| r.metadata.source == "people.csv")
        .map(|r| r.metadata.page)
        .collect();
    assert_eq!(rows, vec![1, 2]);
}

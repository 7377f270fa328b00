//! PowerPoint export: a minimal OOXML presentation with one slide per chart,
//! the picture on the left and its legend in a text box on the right.

use std::io::{Cursor, Write};
use std::path::Path;

use quick_xml::escape::escape;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::chart::RenderedChart;
use crate::error::{Error, ErrorKind, Result};

// 16:9 slide, EMU.
const SLIDE_WIDTH: u64 = 12_192_000;
const SLIDE_HEIGHT: u64 = 6_858_000;
const EMU_PER_PIXEL: u64 = 9_525;
const SIDE_MARGIN: u64 = 457_200;
const TITLE_HEIGHT: u64 = 914_400;
const PICTURE_TOP: u64 = 1_371_600;
const PICTURE_MAX_WIDTH: u64 = 7_620_000;
const LEGEND_GAP: u64 = 228_600;
const LEGEND_LEFT: u64 = SIDE_MARGIN + PICTURE_MAX_WIDTH + LEGEND_GAP;
const LEGEND_MAX_ENTRIES: usize = 24;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const EMPTY_TREE: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

/// Build a `.pptx` with one slide per chart, each titled with the chart title
/// and carrying the chart's legend beside the picture.
pub fn to_pptx(charts: &[RenderedChart]) -> Result<Vec<u8>> {
    if charts.is_empty() {
        return Err(Error::new(ErrorKind::NoData(
            "no charts to put in the presentation".to_string(),
        )));
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut part = |name: &str, body: &[u8]| -> Result<()> {
        zip.start_file(name, options)?;
        zip.write_all(body)?;
        Ok(())
    };

    part("[Content_Types].xml", content_types(charts.len()).as_bytes())?;
    part("_rels/.rels", root_rels().as_bytes())?;
    part("ppt/presentation.xml", presentation(charts.len()).as_bytes())?;
    part(
        "ppt/_rels/presentation.xml.rels",
        presentation_rels(charts.len()).as_bytes(),
    )?;
    part("ppt/slideMasters/slideMaster1.xml", slide_master().as_bytes())?;
    part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships(&[
            ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            ("rId2", "theme", "../theme/theme1.xml"),
        ])
        .as_bytes(),
    )?;
    part("ppt/slideLayouts/slideLayout1.xml", slide_layout().as_bytes())?;
    part(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        relationships(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]).as_bytes(),
    )?;
    part("ppt/theme/theme1.xml", theme().as_bytes())?;

    for (i, chart) in charts.iter().enumerate() {
        let n = i + 1;
        part(&format!("ppt/slides/slide{}.xml", n), slide(chart).as_bytes())?;
        part(
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            relationships(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                ("rId2", "image", &format!("../media/image{}.png", n)),
            ])
            .as_bytes(),
        )?;
        part(&format!("ppt/media/image{}.png", n), &chart.png)?;
    }

    Ok(zip.finish()?.into_inner())
}

pub fn save_pptx(path: impl AsRef<Path>, charts: &[RenderedChart]) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), slides = charts.len(), "Writing presentation");
    std::fs::write(path, to_pptx(charts)?)?;
    Ok(())
}

// ============================================================================
// Parts
// ============================================================================

fn content_types(slides: usize) -> String {
    let mut xml = format!(
        r#"{}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
        XML_HEADER
    );
    for n in 1..=slides {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            n
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels() -> String {
    format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#,
        XML_HEADER, REL_NS
    )
}

fn relationships(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        XML_HEADER
    );
    for (id, kind, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, REL_NS, kind, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Slides take relationship ids rId3 onwards; rId1 is the master and rId2 the theme.
fn presentation(slides: usize) -> String {
    let ids: String = (0..slides)
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 3))
        .collect();
    format!(
        r#"{}<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
        XML_HEADER, NS, ids, SLIDE_WIDTH, SLIDE_HEIGHT
    )
}

fn presentation_rels(slides: usize) -> String {
    let targets: Vec<String> = (1..=slides).map(|n| format!("slides/slide{}.xml", n)).collect();
    let ids: Vec<String> = (0..slides).map(|i| format!("rId{}", i + 3)).collect();
    let mut entries = vec![
        ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        ("rId2", "theme", "theme/theme1.xml"),
    ];
    for (id, target) in ids.iter().zip(&targets) {
        entries.push((id.as_str(), "slide", target.as_str()));
    }
    relationships(&entries)
}

fn slide_master() -> String {
    format!(
        r#"{}<p:sldMaster {}><p:cSld><p:spTree>{}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
        XML_HEADER, NS, EMPTY_TREE
    )
}

fn slide_layout() -> String {
    format!(
        r#"{}<p:sldLayout {} type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        XML_HEADER, NS, EMPTY_TREE
    )
}

fn theme() -> String {
    let accents = ["0176D3", "2E844A", "DD7A01", "BA0517", "9050E9", "06A59A"]
        .iter()
        .enumerate()
        .map(|(i, rgb)| format!(r#"<a:accent{0}><a:srgbClr val="{1}"/></a:accent{0}>"#, i + 1, rgb))
        .collect::<String>();
    let font = r#"<a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/>"#;
    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = format!(r#"<a:ln w="6350">{}</a:ln>"#, fill);
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    format!(
        r#"{header}<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="sfdesk"><a:themeElements><a:clrScheme name="sfdesk"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F2937"/></a:dk2><a:lt2><a:srgbClr val="F3F4F6"/></a:lt2>{accents}<a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="sfdesk"><a:majorFont>{font}</a:majorFont><a:minorFont>{font}</a:minorFont></a:fontScheme><a:fmtScheme name="sfdesk"><a:fillStyleLst>{fills}</a:fillStyleLst><a:lnStyleLst>{lines}</a:lnStyleLst><a:effectStyleLst>{effects}</a:effectStyleLst><a:bgFillStyleLst>{fills}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#,
        header = XML_HEADER,
        accents = accents,
        font = font,
        fills = fill.repeat(3),
        lines = line.repeat(3),
        effects = effect.repeat(3),
    )
}

fn slide(chart: &RenderedChart) -> String {
    let (cx, cy) = picture_extent(chart.width, chart.height);
    format!(
        r#"{header}<p:sld {ns}><p:cSld><p:spTree>{tree}<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{margin}" y="{margin}"/><a:ext cx="{title_width}" cy="{title_height}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="2800" b="1"/><a:t>{title}</a:t></a:r></a:p></p:txBody></p:sp><p:pic><p:nvPicPr><p:cNvPr id="3" name="Chart"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="{margin}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>{legend}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        header = XML_HEADER,
        ns = NS,
        tree = EMPTY_TREE,
        margin = SIDE_MARGIN,
        title_width = SLIDE_WIDTH - 2 * SIDE_MARGIN,
        title_height = TITLE_HEIGHT,
        title = escape(chart.title.as_str()),
        y = PICTURE_TOP,
        cx = cx,
        cy = cy,
        legend = legend(chart),
    )
}

/// Text box with the legend heading and one paragraph per entry, each led
/// by a square in the entry's colour.
fn legend(chart: &RenderedChart) -> String {
    let (entries, more) = chart.legend_lines(LEGEND_MAX_ENTRIES);
    let mut paragraphs = format!(
        r#"<a:p><a:r><a:rPr lang="en-US" sz="1200" b="1"/><a:t>{}</a:t></a:r></a:p>"#,
        escape(chart.legend_heading.as_str())
    );
    for entry in entries {
        let (r, g, b) = entry.color;
        paragraphs.push_str(&format!(
            r#"<a:p><a:r><a:rPr lang="en-US" sz="1100"><a:solidFill><a:srgbClr val="{:02X}{:02X}{:02X}"/></a:solidFill></a:rPr><a:t>&#9632; </a:t></a:r><a:r><a:rPr lang="en-US" sz="1100"/><a:t>{}</a:t></a:r></a:p>"#,
            r,
            g,
            b,
            escape(entry.to_string().as_str())
        ));
    }
    if let Some(more) = more {
        paragraphs.push_str(&format!(
            r#"<a:p><a:r><a:rPr lang="en-US" sz="1100" i="1"/><a:t>{}</a:t></a:r></a:p>"#,
            more
        ));
    }
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="4" name="Legend"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
        x = LEGEND_LEFT,
        y = PICTURE_TOP,
        cx = SLIDE_WIDTH - SIDE_MARGIN - LEGEND_LEFT,
        cy = SLIDE_HEIGHT - PICTURE_TOP - SIDE_MARGIN,
        paragraphs = paragraphs,
    )
}

/// Picture size in EMU at 96 dpi, shrunk to fit below the title and left of
/// the legend.
fn picture_extent(width: u32, height: u32) -> (u64, u64) {
    let cx = u64::from(width.max(1)) * EMU_PER_PIXEL;
    let cy = u64::from(height.max(1)) * EMU_PER_PIXEL;
    let max_cx = PICTURE_MAX_WIDTH;
    let max_cy = SLIDE_HEIGHT - PICTURE_TOP - SIDE_MARGIN;
    let scale = (max_cx as f64 / cx as f64)
        .min(max_cy as f64 / cy as f64)
        .min(1.0);
    ((cx as f64 * scale) as u64, (cy as f64 * scale) as u64)
}

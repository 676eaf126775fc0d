//! Non-interactive CLI mode for scripting and piped input.

use crate::Args;
use rxsage::catalog::{CatalogIndex, loader};
use rxsage::suggest::{SuggestConfig, active_token};
use serde::Serialize;
use std::io::{self, BufRead, IsTerminal, Read, Write};
use tokio_util::sync::CancellationToken;

/// One suggestion for one input line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRecord {
    pub line: usize,
    pub token: String,
    pub label: String,
    pub category: String,
    pub code: Option<String>,
    pub score: f64,
}

/// Run rxsage in CLI mode.
pub async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let sources = args.catalog_sources();
    if sources.is_empty() {
        tracing::warn!("no catalog given; every line will come back empty");
    }
    let index = loader::load_index(&sources, args.index_options(), &CancellationToken::new())
        .await
        .unwrap_or_else(CatalogIndex::empty);
    let config = args.editor_config();

    let mut out = open_output(&args)?;

    // Determine text source
    let text = if let Some(ref input_file) = args.input {
        tokio::fs::read_to_string(input_file).await?
    } else if !io::stdin().is_terminal() {
        // Read from stdin pipe
        let mut buf = String::new();
        io::stdin().lock().read_to_string(&mut buf)?;
        buf
    } else {
        // Interactive CLI mode — read line by line
        return repl(
            io::stdin().lock(),
            &mut io::stdout(),
            &mut out,
            &index,
            config,
            &args.format,
        );
    };

    let records: Vec<SuggestionRecord> = text
        .lines()
        .enumerate()
        .flat_map(|(i, line)| suggest_line(&index, config, i + 1, line))
        .collect();
    print_records(&mut out, &records, &args.format)?;
    Ok(())
}

/// `--output` when given, stdout otherwise. Opened once per run so every
/// REPL line lands in the same file.
fn open_output(args: &Args) -> io::Result<Box<dyn Write>> {
    Ok(match &args.output {
        Some(path) => Box::new(io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(io::stdout()),
    })
}

/// Line-by-line REPL: prompts on `prompt`, writes records to `out`.
fn repl(
    mut input: impl BufRead,
    prompt: &mut dyn Write,
    out: &mut dyn Write,
    index: &CatalogIndex,
    config: SuggestConfig,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut line_no = 0;

    loop {
        write!(prompt, "rxsage> ")?;
        prompt.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        line_no += 1;
        let records = suggest_line(index, config, line_no, trimmed);
        if let Err(e) = print_records(out, &records, format) {
            tracing::warn!(line = line_no, "could not write suggestions: {e}");
        }
    }

    Ok(())
}

/// Suggestions for the token at the end of `text`, gated like the editor.
pub fn suggest_line(
    index: &CatalogIndex,
    config: SuggestConfig,
    line: usize,
    text: &str,
) -> Vec<SuggestionRecord> {
    let Some(token) = active_token(text, text.chars().count()) else {
        return Vec::new();
    };
    if token.char_len() < config.min_token_chars {
        return Vec::new();
    }
    index
        .search_scored(&token.text, config.max_results)
        .into_iter()
        .map(|(entry, score)| SuggestionRecord {
            line,
            token: token.text.clone(),
            label: entry.label.clone(),
            category: entry.category.clone(),
            code: entry.code.clone(),
            score,
        })
        .collect()
}

/// Write records in the requested format and flush.
fn print_records(
    writer: &mut dyn Write,
    records: &[SuggestionRecord],
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "csv" => print_csv(writer, records)?,
        "json" => print_json(writer, records)?,
        _ => print_table(writer, records)?,
    }
    writer.flush()?;
    Ok(())
}

const COLUMNS: [&str; 6] = ["line", "token", "label", "category", "code", "score"];

fn cells(r: &SuggestionRecord) -> [String; 6] {
    [
        r.line.to_string(),
        r.token.clone(),
        r.label.clone(),
        r.category.clone(),
        r.code.clone().unwrap_or_default(),
        format!("{:.3}", r.score),
    ]
}

/// Print records as an ASCII table.
fn print_table(
    writer: &mut dyn Write,
    records: &[SuggestionRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    let rows: Vec<[String; 6]> = records.iter().map(cells).collect();

    // Calculate column widths
    let widths: Vec<usize> = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let max_data = rows.iter().map(|r| r[i].chars().count()).max().unwrap_or(0);
            col.len().max(max_data)
        })
        .collect();

    // Header
    let header: Vec<String> = COLUMNS
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<width$}", c, width = w))
        .collect();
    writeln!(writer, "{}", header.join(" | "))?;

    // Separator
    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(writer, "{}", sep.join("-+-"))?;

    // Data rows
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(val, w)| format!("{:<width$}", val, width = w))
            .collect();
        writeln!(writer, "{}", line.join(" | "))?;
    }

    writeln!(writer, "\n({} suggestions)", rows.len())?;
    Ok(())
}

/// Print records as CSV.
fn print_csv(
    writer: &mut dyn Write,
    records: &[SuggestionRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(writer, "{}", COLUMNS.join(","))?;
    for record in records {
        let escaped: Vec<String> = cells(record).iter().map(|v| csv_field(v)).collect();
        writeln!(writer, "{}", escaped.join(","))?;
    }
    Ok(())
}

fn csv_field(v: &str) -> String {
    if v.contains(',') || v.contains('"') || v.contains('\n') {
        format!("\"{}\"", v.replace('"', "\"\""))
    } else {
        v.to_string()
    }
}

/// Print records as JSON.
fn print_json(
    writer: &mut dyn Write,
    records: &[SuggestionRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(&mut *writer, records)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxsage::catalog::{CatalogEntry, IndexOptions};
    use serde_json::Map;

    fn index() -> CatalogIndex {
        let entries = [("Paracetamol 500mg", "medicine"), ("Pantoprazole 40mg", "medicine")]
            .map(|(label, category)| CatalogEntry {
                label: label.to_string(),
                code: Some(format!("SKU-{}", &label[..4])),
                category: category.to_string(),
                attributes: Map::new(),
            });
        CatalogIndex::build(entries, IndexOptions::default())
    }

    fn record(label: &str) -> SuggestionRecord {
        SuggestionRecord {
            line: 1,
            token: "para".into(),
            label: label.into(),
            category: "medicine".into(),
            code: None,
            score: 0.0,
        }
    }

    #[test]
    fn suggest_line_uses_trailing_token() {
        let records = suggest_line(&index(), SuggestConfig::default(), 3, "Tab paracet");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line, 3);
        assert_eq!(records[0].token, "paracet");
        assert_eq!(records[0].label, "Paracetamol 500mg");
        assert_eq!(records[0].code.as_deref(), Some("SKU-Para"));
        assert_eq!(records[0].score, 0.0);
    }

    #[test]
    fn suggest_line_skips_short_and_trailing_space() {
        assert!(suggest_line(&index(), SuggestConfig::default(), 1, "Tab pa").is_empty());
        assert!(suggest_line(&index(), SuggestConfig::default(), 1, "paracet ").is_empty());
        assert!(suggest_line(&index(), SuggestConfig::default(), 1, "").is_empty());
    }

    #[test]
    fn csv_quotes_commas() {
        let mut out = Vec::new();
        print_csv(&mut out, &[record("Iron, folic acid")]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "line,token,label,category,code,score\n1,para,\"Iron, folic acid\",medicine,,0.000\n"
        );
    }

    #[test]
    fn json_is_an_array_of_records() {
        let mut out = Vec::new();
        print_json(&mut out, &[record("Paracetamol 500mg")]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["label"], "Paracetamol 500mg");
        assert_eq!(value[0]["code"], serde_json::Value::Null);
    }

    #[test]
    fn repl_appends_every_line_to_one_writer() {
        let input = io::Cursor::new("Tab paracet\n\nGive pantopra\nquit\nTab paracet\n");
        let mut prompt = Vec::new();
        let mut out = Vec::new();
        repl(input, &mut prompt, &mut out, &index(), SuggestConfig::default(), "csv").unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "line,token,label,category,code,score",
                "1,paracet,Paracetamol 500mg,medicine,SKU-Para,0.000",
                "line,token,label,category,code,score",
                "2,pantopra,Pantoprazole 40mg,medicine,SKU-Pant,0.000",
            ]
        );
        assert_eq!(String::from_utf8(prompt).unwrap(), "rxsage> ".repeat(4));
    }

    #[test]
    fn output_file_collects_all_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let args = crate::Args {
            output: Some(path.clone()),
            ..<crate::Args as clap::Parser>::parse_from(["rxsage"])
        };
        {
            let mut out = open_output(&args).unwrap();
            print_records(&mut out, &[record("Paracetamol 500mg")], "json").unwrap();
            print_records(&mut out, &[record("Pantoprazole 40mg")], "json").unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Paracetamol 500mg"));
        assert!(text.contains("Pantoprazole 40mg"));
    }

    #[test]
    fn table_pads_columns() {
        let mut out = Vec::new();
        print_table(&mut out, &[record("Paracetamol 500mg")]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("line | token | label"));
        assert!(text.ends_with("(1 suggestions)\n"));
    }
}

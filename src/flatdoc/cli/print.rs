use colored::Colorize;
use flatdoc::commands::{CmdMessage, DocumentSummary, MessageLevel};
use flatdoc::error::Result;
use flatdoc::table::Cell;
use flatdoc::{DocumentRef, PathResolver};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const KEY_WIDTH: usize = 40;

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => eprintln!("{}", message.content.red()),
        }
    }
}

/// One line per document: key, variant, then the path relative to `root`.
pub(super) fn print_listing(listed: &[DocumentSummary], root: &PathResolver) {
    for summary in listed {
        let key = truncate_to_width(&summary.key, KEY_WIDTH);
        let padding = KEY_WIDTH.saturating_sub(key.width());
        let variant = format!("{:<18}", summary.variant.unwrap_or(""));
        let path = summary
            .path
            .as_deref()
            .map(|p| root.relative(p).unwrap_or(p).display().to_string())
            .unwrap_or_default();

        println!(
            "{}{} {} {}",
            key.bold(),
            " ".repeat(padding),
            variant.cyan(),
            path.dimmed()
        );
    }
}

pub(super) fn print_documents(docs: &[DocumentRef], json: bool) -> Result<()> {
    for (i, doc) in docs.iter().enumerate() {
        let doc = doc.borrow();
        if json {
            println!("{}", serde_json::to_string_pretty(&*doc)?);
            continue;
        }

        if i > 0 {
            println!();
        }
        let title = match doc.variant() {
            Some(variant) => format!("{} ({}.{})", doc.key(), doc.doc_type().name, variant.suffix),
            None => format!("{} ({})", doc.key(), doc.doc_type().name),
        };
        println!("{}", title.bold());
        if let Some(path) = doc.path() {
            println!("{}", path.display().to_string().dimmed());
        }
        println!("--------------------------------");
        print!("{}", doc.to_text()?);
    }
    Ok(())
}

pub(super) fn print_cells(cells: &[(String, Cell)]) {
    for (_, cell) in cells {
        match cell {
            Cell::Empty => println!("{}", "(empty)".dimmed()),
            other => println!("{}", other),
        }
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

use crate::context::Context;
use crate::rank;
use crate::Document;

/// psql-style table of the results with an index column. Empty input renders
/// as an empty string.
pub fn render_table(ctx: &Context, docs: &[Document]) -> String {
    if docs.is_empty() {
        ctx.scope(|| tracing::warn!("got an empty list, nothing to display"));
        return String::new();
    }

    let header = ["", "title", "filepath", "rank"];
    let rows: Vec<[String; 4]> = docs
        .iter()
        .enumerate()
        .map(|(i, d)| [i.to_string(), d.title.clone(), d.filepath.clone(), format!("{:.5}", d.rank)])
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    // index and rank are numeric and right-aligned
    let right = [true, false, false, true];

    let rule = |corner: char, edge: char| {
        let inner = widths.iter().map(|w| "-".repeat(w + 2)).collect::<Vec<_>>().join(&corner.to_string());
        format!("{edge}{inner}{edge}\n")
    };
    let line = |cells: [&str; 4]| {
        let inner = cells
            .iter()
            .zip(widths)
            .zip(right)
            .map(|((cell, w), r)| {
                let pad = " ".repeat(w - cell.chars().count());
                if r { format!(" {pad}{cell} ") } else { format!(" {cell}{pad} ") }
            })
            .collect::<Vec<_>>()
            .join("|");
        format!("|{inner}|\n")
    };

    let mut out = rule('+', '+');
    out.push_str(&line(header));
    out.push_str(&rule('+', '|'));
    for row in &rows {
        out.push_str(&line([row[0].as_str(), row[1].as_str(), row[2].as_str(), row[3].as_str()]));
    }
    out.push_str(&rule('+', '+'));
    out
}

/// Log how many of `docs` count as recommended and return that number.
pub fn summary(ctx: &Context, docs: &[Document], threshold: f64) -> usize {
    let recommended = rank::classify(docs, threshold);
    ctx.scope(|| {
        tracing::info!(threshold, "using threshold to classify document as recommended: >= {threshold:.1}");
        tracing::info!(recommended, total = docs.len(), "recommended docs: {}/{}", recommended, docs.len());
    });
    recommended
}

use crate::context::Context;
use crate::Document;

/// Min-max scale ranks to [0, 1], keeping the engine's order.
///
/// When every rank is equal (one result, or a full tie) there is no spread to
/// scale by and the documents come back with their ranks unchanged.
pub fn normalize(ctx: &Context, docs: &[Document]) -> Vec<Document> {
    let _guard = ctx.span().enter();
    let Some(first) = docs.first() else { return Vec::new() };

    let (min, max) = docs.iter().fold((first.rank, first.rank), |(lo, hi), d| (lo.min(d.rank), hi.max(d.rank)));
    let spread = max - min;
    if spread == 0.0 {
        tracing::info!(rank = min, "all ranks are equal, leaving them unscaled");
        return docs.to_vec();
    }

    tracing::info!(min, max, "scaled ranks in range [0, 1]");
    docs.iter().map(|d| d.with_rank((d.rank - min) / spread)).collect()
}

/// Number of documents whose rank reaches `threshold`.
pub fn classify(docs: &[Document], threshold: f64) -> usize {
    docs.iter().filter(|d| d.rank >= threshold).count()
}

/// Documents whose rank reaches `threshold`, in their original order.
pub fn relevant(docs: &[Document], threshold: f64) -> Vec<Document> {
    docs.iter().filter(|d| d.rank >= threshold).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(ranks: &[f64]) -> Vec<Document> {
        ranks.iter().enumerate().map(|(i, r)| Document::new(format!("t{i}"), format!("article{i}.txt"), *r)).collect()
    }

    fn ranks(docs: &[Document]) -> Vec<f64> { docs.iter().map(|d| d.rank).collect() }

    #[test]
    fn scales_to_unit_interval_in_place_order() {
        let ctx = Context::with_id("test");
        let out = normalize(&ctx, &docs(&[0.2, 0.8, 0.5]));
        let r = ranks(&out);
        assert_eq!(r[0], 0.0);
        assert_eq!(r[1], 1.0);
        assert!((r[2] - 0.5).abs() < 1e-12);
        assert_eq!(out[1].title, "t1");
    }

    #[test]
    fn tied_ranks_pass_through() {
        let ctx = Context::with_id("test");
        assert_eq!(ranks(&normalize(&ctx, &docs(&[0.4, 0.4]))), vec![0.4, 0.4]);
        assert_eq!(ranks(&normalize(&ctx, &docs(&[0.07]))), vec![0.07]);
        assert!(normalize(&ctx, &[]).is_empty());
    }

    #[test]
    fn input_is_left_untouched() {
        let ctx = Context::with_id("test");
        let input = docs(&[3.0, 1.0]);
        let _ = normalize(&ctx, &input);
        assert_eq!(ranks(&input), vec![3.0, 1.0]);
    }

    #[test]
    fn classify_counts_threshold_inclusive() {
        assert_eq!(classify(&docs(&[0.3, 0.5, 0.9]), 0.5), 2);
        assert_eq!(classify(&docs(&[]), 0.5), 0);
        assert_eq!(classify(&docs(&[0.1, 0.2]), 0.0), 2);
    }

    #[test]
    fn relevant_preserves_order() {
        let picked = relevant(&docs(&[1.0, 0.2, 0.7, 0.5]), 0.5);
        let titles: Vec<_> = picked.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["t0", "t2", "t3"]);
    }
}

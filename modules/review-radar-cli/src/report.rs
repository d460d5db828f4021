//! Terminal summary of an analysis run.

use std::fmt::Write;

use review_radar_common::{AnalysisResult, KeywordWeight};

const KEYWORDS_SHOWN: usize = 10;

pub fn render(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let dist = result.sentiment;

    let _ = writeln!(out, "Reviews analysed: {} (mode: {})", result.n_reviews, result.mode);
    let _ = writeln!(
        out,
        "Overall: {:.1}% positive, {:.1}% neutral, {:.1}% negative | score {:+.3} | {:.2} stars",
        dist.positive * 100.0,
        dist.neutral * 100.0,
        dist.negative * 100.0,
        result.overall_score,
        result.overall_rating_stars,
    );
    let _ = writeln!(
        out,
        "Verdict: {} ({:.1}% positive)",
        result.grade, result.positive_percent
    );
    let conf = result.average_confidence;
    let _ = writeln!(
        out,
        "Average confidence: positive {} | neutral {} | negative {}",
        confidence(conf.positive),
        confidence(conf.neutral),
        confidence(conf.negative),
    );
    let auth = &result.authenticity;
    let _ = writeln!(
        out,
        "Authenticity: {:.0} chars/review | sentiment variance {:.4} | {} distinct keywords | {} categories covered",
        auth.avg_review_length, auth.sentiment_variance, auth.keyword_diversity, auth.category_coverage,
    );

    if result.categories.is_empty() {
        let _ = writeln!(out, "\nNo aspects were mentioned.");
    }
    for category in &result.categories {
        let counts = category.sentiment_counts;
        let _ = writeln!(
            out,
            "\n[{}] {} reviews | mean {:+.3} | {:.2} stars | sentences +{} ={} -{}",
            category.aspect,
            category.mention_count,
            category.mean_score,
            category.rating_stars,
            counts.positive,
            counts.neutral,
            counts.negative,
        );
        for example in &category.top_positive_examples {
            let _ = writeln!(out, "  + {example}");
        }
        for example in &category.top_negative_examples {
            let _ = writeln!(out, "  - {example}");
        }
    }

    keyword_line(&mut out, "Top positive keywords", &result.top_positive);
    keyword_line(&mut out, "Top negative keywords", &result.top_negative);
    out
}

fn confidence(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

fn keyword_line(out: &mut String, title: &str, keywords: &[KeywordWeight]) {
    let terms: Vec<&str> = keywords
        .iter()
        .take(KEYWORDS_SHOWN)
        .map(|k| k.term.as_str())
        .collect();
    let listed = if terms.is_empty() {
        "(none)".to_string()
    } else {
        terms.join(", ")
    };
    let _ = writeln!(out, "\n{title}: {listed}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_radar_common::{
        AspectMethod, AuthenticityMetrics, AverageConfidence, CategoryStats, Grade,
        SentimentCounts, SentimentDistribution,
    };

    fn sample() -> AnalysisResult {
        AnalysisResult {
            sentiment: SentimentDistribution {
                positive: 0.5,
                neutral: 0.0,
                negative: 0.5,
            },
            counts: SentimentCounts {
                positive: 1,
                neutral: 0,
                negative: 1,
            },
            n_reviews: 2,
            categories: vec![CategoryStats {
                aspect: "battery".into(),
                mean_score: 0.0,
                mention_count: 2,
                rating_stars: 3.0,
                sentiment_counts: SentimentCounts {
                    positive: 1,
                    neutral: 0,
                    negative: 1,
                },
                top_positive_examples: vec!["Battery life is amazing.".into()],
                top_negative_examples: vec!["Battery drains fast.".into()],
            }],
            overall_score: 0.0,
            overall_rating_stars: 3.0,
            top_positive: vec![KeywordWeight {
                term: "amazing".into(),
                score: 0.7,
            }],
            top_negative: vec![],
            mode: AspectMethod::Keywords,
            positive_percent: 50.0,
            grade: Grade::Mixed,
            average_confidence: AverageConfidence {
                positive: Some(0.9),
                neutral: None,
                negative: Some(0.8),
            },
            authenticity: AuthenticityMetrics {
                avg_review_length: 23.0,
                sentiment_variance: 0.0556,
                keyword_diversity: 1,
                category_coverage: 1,
            },
            ..AnalysisResult::default()
        }
    }

    #[test]
    fn renders_overall_categories_and_keywords() {
        let text = render(&sample());
        assert!(text.contains("Reviews analysed: 2 (mode: keywords)"));
        assert!(text.contains("50.0% positive"));
        assert!(text.contains("[battery] 2 reviews"));
        assert!(text.contains("3.00 stars"));
        assert!(text.contains("  + Battery life is amazing."));
        assert!(text.contains("  - Battery drains fast."));
        assert!(text.contains("Top positive keywords: amazing"));
        assert!(text.contains("Top negative keywords: (none)"));
    }

    #[test]
    fn renders_verdict_confidence_and_authenticity() {
        let text = render(&sample());
        assert!(text.contains("Verdict: Mixed (50.0% positive)"));
        assert!(text.contains("positive 0.900 | neutral n/a | negative 0.800"));
        assert!(text.contains("23 chars/review"));
        assert!(text.contains("1 categories covered"));
    }

    #[test]
    fn says_so_when_nothing_matched() {
        let mut result = sample();
        result.categories.clear();
        assert!(render(&result).contains("No aspects were mentioned."));
    }
}

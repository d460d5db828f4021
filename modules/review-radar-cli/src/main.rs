//! Review Radar command line: analyse a review file or a scraped product page.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use review_radar_analysis::{hosted, AnalysisPipeline};
use review_radar_common::config::default_aspects;
use review_radar_common::{
    AnalysisConfig, AnalysisResult, AspectMethod, InferenceConfig, ScraperConfig,
};
use review_radar_scraper::{BrowserlessFetcher, ReviewScraper, ReviewSource};

mod input;
mod report;

use input::InputFormat;

#[derive(Parser)]
#[command(name = "review-radar")]
#[command(about = "Aspect-level sentiment analysis for product reviews")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse reviews from a local file
    Analyze {
        /// JSON Lines, CSV or plain-text review file
        #[arg(long)]
        input: PathBuf,

        /// File format; inferred from the extension when omitted
        #[arg(long, value_enum)]
        format: Option<InputFormat>,

        /// JSON field or CSV column holding the review text
        #[arg(long, default_value = "review_text")]
        field: String,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Scrape a product page and analyse its reviews
    Scrape {
        #[arg(long)]
        url: String,

        #[arg(long, default_value_t = 500)]
        max_reviews: usize,

        /// Scrape timeout in seconds
        #[arg(long, default_value_t = 60)]
        timeout: u64,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

#[derive(Args)]
struct AnalysisArgs {
    /// Comma-separated aspect labels
    #[arg(long, value_delimiter = ',')]
    aspects: Vec<String>,

    /// Aspect assignment method (zsc or keywords)
    #[arg(long, default_value = "zsc")]
    method: AspectMethod,

    /// Minimum zero-shot score for an aspect assignment
    #[arg(long)]
    zsc_threshold: Option<f64>,

    /// Classify every sentence even when the text repeats
    #[arg(long)]
    no_cache: bool,

    /// Number of keywords kept per polarity
    #[arg(long)]
    top_n: Option<usize>,

    /// Write the full JSON result here
    #[arg(long)]
    output: Option<PathBuf>,
}

impl AnalysisArgs {
    fn config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig {
            aspect_method: self.method,
            cache_enabled: !self.no_cache,
            ..AnalysisConfig::default()
        };
        if let Some(threshold) = self.zsc_threshold {
            config.zsc_threshold = threshold;
        }
        if let Some(top_n) = self.top_n {
            config.keyword_top_n = top_n;
        }
        config
    }

    fn aspects(&self) -> Vec<String> {
        let aspects: Vec<String> = self
            .aspects
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if aspects.is_empty() {
            default_aspects()
        } else {
            aspects
        }
    }
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("review_radar=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (reviews, analysis) = match cli.command {
        Commands::Analyze {
            input,
            format,
            field,
            analysis,
        } => {
            let contents = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let format = format.unwrap_or_else(|| InputFormat::infer(&input));
            let reviews = input::parse_reviews(&contents, format, &field)?;
            info!(path = %input.display(), reviews = reviews.len(), "Loaded reviews");
            (reviews, analysis)
        }
        Commands::Scrape {
            url,
            max_reviews,
            timeout,
            analysis,
        } => {
            let scraper_config = ScraperConfig::from_env()?;
            let fetcher =
                BrowserlessFetcher::from_config(&scraper_config, Duration::from_secs(timeout))?;
            let reviews = ReviewScraper::new(fetcher).fetch(&url, max_reviews).await?;
            info!(%url, reviews = reviews.len(), "Scraped reviews");
            (reviews, analysis)
        }
    };

    let result = analyse(&reviews, &analysis).await?;

    print!("{}", report::render(&result));
    if let Some(path) = &analysis.output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nResult written to {}", path.display());
    }

    Ok(())
}

async fn analyse(reviews: &[String], args: &AnalysisArgs) -> Result<AnalysisResult> {
    let inference = InferenceConfig::from_env()?;
    let (classifier, scorer) = hosted::from_config(&inference)?;
    let pipeline =
        AnalysisPipeline::new(Arc::new(classifier)).with_aspect_scorer(Arc::new(scorer));

    let result = pipeline.run(reviews, &args.aspects(), &args.config()).await?;
    Ok(result)
}

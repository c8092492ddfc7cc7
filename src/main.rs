//! Line-mode driver for the sightline client core.
//!
//! Reads questions from stdin, streams progress lines while the backend's
//! agents work, and prints the classified result. Commands:
//!
//! - `/new` - start a fresh conversation
//! - `/threads` - list conversations
//! - `/switch <n>` - switch to conversation n
//! - `/open <url> [title]` - show a dashboard embed
//! - `/hide` - hide the visible dashboard
//! - `/quit` - save and exit

use std::sync::Arc;

use color_eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use sightline::app::{App, AppMessage};
use sightline::client::AnalyticsClient;
use sightline::config::AppConfig;
use sightline::embed::{BrowserSurfaceFactory, EmbedCache};
use sightline::models::{
    AnalysisResult, ChartData, ClassifiedResult, MessageBody, TableResult,
};
use sightline::store::{persist, ConversationStore};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env();
    let data_dir = config.resolved_data_dir();

    let threads = persist::load_threads(&data_dir).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load saved conversations");
        Vec::new()
    });
    let store = ConversationStore::from_threads(threads);
    let embeds = EmbedCache::new(Box::new(BrowserSurfaceFactory), config.app_url_parsed());
    let client = Arc::new(AnalyticsClient::from_config(&config));

    println!("sightline - ask a question, or /quit to exit");
    let (mut app, mut messages) = App::new(config, client, store, embeds);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(input) => {
                        if !handle_input(&mut app, input.trim()) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            Some(message) = messages.recv() => {
                render_message(&mut app, message);
            }
        }
        app.tick();
        for notice in app.notices.drain() {
            eprintln!("[{:?}] {}", notice.level, notice.text);
        }
    }

    persist::save_threads(&app.data_dir(), app.store.threads())?;
    Ok(())
}

/// Handle one input line. Returns false to exit.
fn handle_input(app: &mut App, input: &str) -> bool {
    match input {
        "" => true,
        "/quit" | "/exit" => false,
        "/new" => {
            app.new_conversation();
            println!("Started a new conversation.");
            true
        }
        "/threads" => {
            for (idx, thread) in app.store.threads().iter().enumerate() {
                let marker = if thread.id == app.store.active_thread().id {
                    "*"
                } else {
                    " "
                };
                let title = if thread.title.is_empty() {
                    "(new conversation)"
                } else {
                    thread.title.as_str()
                };
                println!("{} {}. {}", marker, idx + 1, title);
            }
            true
        }
        "/hide" => {
            app.hide_dashboard();
            true
        }
        other => {
            if let Some(rest) = other.strip_prefix("/switch ") {
                switch_by_number(app, rest.trim());
            } else if let Some(rest) = other.strip_prefix("/open ") {
                let mut parts = rest.trim().splitn(2, ' ');
                let url = parts.next().unwrap_or_default().to_string();
                let title = parts.next().unwrap_or("Dashboard").to_string();
                app.show_dashboard(&url, &title);
            } else if other.starts_with('/') {
                println!("Unknown command: {}", other);
            } else {
                app.submit(other);
            }
            true
        }
    }
}

fn switch_by_number(app: &mut App, arg: &str) {
    let Ok(number) = arg.parse::<usize>() else {
        println!("Usage: /switch <number>");
        return;
    };
    let id = app
        .store
        .threads()
        .get(number.saturating_sub(1))
        .map(|t| t.id.clone());
    match id {
        Some(id) => app.switch_conversation(&id),
        None => println!("No conversation {}", number),
    }
}

/// Render one app message to the terminal.
fn render_message(app: &mut App, message: AppMessage) {
    if let AppMessage::Progress { ref lines, .. } = message {
        if let Some(line) = lines.last() {
            println!("  {} {}", line.icon, line.text);
        }
    }
    let resolved = matches!(message, AppMessage::StreamResolved { .. });
    app.handle_message(message);
    if resolved {
        if let Some(last) = app.store.active_thread().messages.last() {
            render_body(&last.body);
        }
    }
}

fn render_body(body: &MessageBody) {
    match body {
        MessageBody::Text { text } => println!("{}", text),
        MessageBody::Error { message } => println!("✗ {}", message),
        MessageBody::Result { result } => render_result(result),
        MessageBody::InProgress { .. } => {}
    }
}

fn render_result(result: &ClassifiedResult) {
    match result {
        ClassifiedResult::Text { text } => println!("{}", text),
        ClassifiedResult::Error { message } => println!("✗ {}", message),
        ClassifiedResult::Analysis(analysis) => render_analysis(analysis),
        ClassifiedResult::Table(table) => render_table(table),
        ClassifiedResult::Chart(chart) => {
            if !chart.title.is_empty() {
                println!("{}", chart.title);
            }
            match &chart.data {
                ChartData::Breakdown {
                    categories,
                    percentages,
                } => {
                    for (category, pct) in categories.iter().zip(percentages) {
                        println!("  {:<20} {:>6.1}%", category, pct);
                    }
                }
                ChartData::Series { labels, datasets } => {
                    println!("  {} series over {} points", datasets.len(), labels.len());
                    for series in datasets {
                        println!("  - {}", series.label);
                    }
                }
            }
            if let Some(insights) = &chart.insights {
                println!("{}", insights);
            }
        }
        ClassifiedResult::Embed(pointer) => {
            println!(
                "Dashboard available: {} ({})",
                pointer.title.as_deref().unwrap_or("Dashboard"),
                pointer.url
            );
            println!("Use /open {} to view it.", pointer.url);
        }
    }
}

fn render_analysis(analysis: &AnalysisResult) {
    if let Some(query) = analysis.formatted_query() {
        println!("--- query ---");
        println!("{}", query);
    }
    if let Some(explanation) = &analysis.explanation {
        println!("{}", explanation);
    }
    if let Some(sample) = &analysis.sample_analysis {
        println!("{}", sample);
    }
    if let Some(viz) = &analysis.visualization_analysis {
        println!("{}", viz);
    }
    if let Some(csv) = &analysis.csv_url {
        println!("Data export: {}", csv);
    }
    if let Some(chart) = &analysis.chart_url {
        println!("Dashboard: {} (use /open {})", chart, chart);
    }
}

fn render_table(table: &TableResult) {
    if !table.title.is_empty() {
        println!("{}", table.title);
    }
    if let Some(period) = &table.period_label {
        println!("Period: {}", period);
    }
    let labels: Vec<&str> = table.columns.iter().map(|c| c.label.as_str()).collect();
    if !labels.is_empty() {
        println!("{}", labels.join(" | "));
    }
    for row in &table.rows {
        println!("{}", row);
    }
    println!("{} row(s)", table.total_count);
    if !table.summary.is_empty() {
        println!("{}", table.summary);
    }
}

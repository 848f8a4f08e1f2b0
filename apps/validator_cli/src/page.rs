//! Interactive results page: owns the page address, drives the fetch
//! controller and prints every state change.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use client_core::{
    download::download_report, FetchState, ReportFetchController, ValidationApi,
};
use shared::domain::{replace_mode, Mode, QueryParams};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    task::JoinSet,
};
use tracing::{debug, info, warn};

use crate::view;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCommand {
    Retry,
    Rerun(Mode),
    Download,
    Quit,
}

impl PageCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "retry" => Some(PageCommand::Retry),
            "f" | "fast" => Some(PageCommand::Rerun(Mode::Fast)),
            "d" | "deep" => Some(PageCommand::Rerun(Mode::Deep)),
            "s" | "save" | "download" => Some(PageCommand::Download),
            "q" | "quit" | "exit" => Some(PageCommand::Quit),
            _ => None,
        }
    }
}

pub struct ResultPage {
    address: String,
    params: QueryParams,
    controller: ReportFetchController,
    api: Arc<dyn ValidationApi>,
    download_dir: PathBuf,
    downloads: JoinSet<()>,
}

impl ResultPage {
    pub fn open(
        address: String,
        api: Arc<dyn ValidationApi>,
        download_dir: PathBuf,
    ) -> Result<Self> {
        let params = QueryParams::from_address(&address)?;
        Ok(Self {
            address,
            params,
            controller: ReportFetchController::new(Arc::clone(&api)),
            api,
            download_dir,
            downloads: JoinSet::new(),
        })
    }

    /// Runs until the first settled state and returns it.
    pub async fn run_once(&self) -> Result<FetchState> {
        let outcome = self.controller.fetch(self.params.clone()).await;
        debug!(?outcome, "single fetch finished");
        let snapshot = self.controller.snapshot();
        print!("{}", view::render(&snapshot));
        Ok(snapshot.state)
    }

    /// Renders state changes and handles commands read from stdin until the
    /// user quits, stdin closes or Ctrl-C arrives.
    pub async fn run_interactive(mut self) -> Result<()> {
        if !self.params.has_idea() {
            println!("{}", view::NO_IDEA_MESSAGE);
            return Ok(());
        }

        let mut updates = self.controller.subscribe();
        self.controller.spawn_fetch(self.params.clone());
        print!("{}", view::render(&updates.borrow_and_update()));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    print!("{}", view::render(&snapshot));
                }
                line = lines.next_line() => {
                    let Some(line) = line.context("failed to read command from stdin")? else {
                        break;
                    };
                    match PageCommand::parse(&line) {
                        Some(PageCommand::Quit) => break,
                        Some(command) => self.handle(command)?,
                        None if line.trim().is_empty() => {}
                        None => println!("commands: r (retry), f (fast), d (deep), s (download), q (quit)"),
                    }
                }
                _ = &mut ctrl_c => {
                    info!("interrupted; abandoning in-flight request");
                    break;
                }
            }
        }

        self.controller.cancel();
        self.finish_downloads().await;
        Ok(())
    }

    /// Waits for every download started from this page; they are not
    /// cancelled when the page closes.
    async fn finish_downloads(&mut self) {
        if !self.downloads.is_empty() {
            info!(pending = self.downloads.len(), "waiting for report downloads");
        }
        while let Some(joined) = self.downloads.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "report download task failed");
            }
        }
    }

    fn handle(&mut self, command: PageCommand) -> Result<()> {
        match command {
            PageCommand::Retry => {
                self.controller.spawn_fetch(self.params.clone());
            }
            PageCommand::Rerun(mode) => {
                self.navigate(replace_mode(&self.address, mode)?)?;
                self.controller.spawn_fetch(self.params.clone());
            }
            PageCommand::Download => {
                let api = Arc::clone(&self.api);
                let dir = self.download_dir.clone();
                self.downloads.spawn(async move {
                    match download_report(api.as_ref(), &dir).await {
                        Ok(path) => println!("📥 Saved report to {}", path.display()),
                        Err(err) => println!("ALERT: {}", err.alert_message()),
                    }
                });
            }
            PageCommand::Quit => {}
        }
        Ok(())
    }

    fn navigate(&mut self, address: String) -> Result<()> {
        info!(%address, "replacing page address");
        self.params = QueryParams::from_address(&address)?;
        self.address = address;
        Ok(())
    }
}

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::InterpreterConfig;
use crate::dump::RecordDump;
use crate::filter::{FilterDecision, RelationFilter};
use crate::interpret::Interpreter;
use crate::record::{RawRecord, RecordHeader, RelFileNode};
use crate::rmgr::{codebook, ManagerClass, ResourceManager};
use crate::metrics;

#[derive(Parser, Debug)]
#[command(
    name = "gpwal",
    version,
    about = "Greenplum 6 WAL record validator and RelFileNode extractor",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Проверить записи дампа и показать, какое отношение меняет каждая.
    Inspect {
        #[arg(long)]
        input: PathBuf,
        /// BLCKSZ исходного кластера (по умолчанию GPWAL_PAGE_SIZE или 32768).
        #[arg(long)]
        page_size: Option<u32>,
        /// Только форма заголовка, без CRC и извлечения отношения.
        #[arg(long)]
        header_only: bool,
        #[arg(long)]
        json: bool,
    },
    /// Классифицировать записи дампа: pass/drop по списку баз.
    Filter {
        #[arg(long)]
        input: PathBuf,
        /// OID базы, записи которой сохраняются (можно несколько раз).
        #[arg(long = "db", required = true)]
        databases: Vec<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Напечатать кодовую книгу менеджеров ресурсов.
    Rmgr {
        #[arg(long)]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Inspect {
            input,
            page_size,
            header_only,
            json,
        } => cmd_inspect(&input, page_size, header_only, json),
        Cmd::Filter {
            input,
            databases,
            page_size,
            json,
        } => cmd_filter(&input, page_size, databases, json),
        Cmd::Rmgr { json } => cmd_rmgr(json),
    }
}

fn interpreter(page_size: Option<u32>) -> Result<Interpreter> {
    let mut cfg = InterpreterConfig::from_env();
    if let Some(ps) = page_size {
        cfg = cfg.with_page_size(ps);
    }
    info!("{}", cfg);
    Interpreter::from_config(&cfg)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read record dump {}", path.display()))
}

#[derive(Serialize)]
struct InspectLine<'a> {
    offset: usize,
    rmgr: &'a str,
    op: &'a str,
    header: RecordHeader,
    relation: Option<RelFileNode>,
    error: Option<String>,
}

pub fn cmd_inspect(input: &Path, page_size: Option<u32>, header_only: bool, json: bool) -> Result<()> {
    let interp = interpreter(page_size)?;
    let bytes = read_input(input)?;

    let mut failed = 0usize;
    let mut total = 0usize;
    for item in RecordDump::new(&bytes) {
        let (offset, buf) = item?;
        total += 1;
        let rec = RawRecord::new(buf)?;
        let rm = ResourceManager::from_id(rec.rmid());

        let (relation, error) = if header_only {
            match interp.check_header(buf) {
                Ok(()) => (None, None),
                Err(e) => (None, Some(e.to_string())),
            }
        } else {
            match interp.interpret(buf) {
                Ok(v) => (v.relation, None),
                Err(e) => (None, Some(e.to_string())),
            }
        };
        if error.is_some() {
            failed += 1;
        }

        let line = InspectLine {
            offset,
            rmgr: rm.map(|r| r.name()).unwrap_or("?"),
            op: rm.map(|r| r.opcode_name(rec.info())).unwrap_or("?"),
            header: rec.header(),
            relation,
            error,
        };
        if json {
            println!("{}", serde_json::to_string(&line)?);
        } else {
            let rel = line
                .relation
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            match &line.error {
                None => println!(
                    "off={:<10} {:<14} {:<34} len={:<8} tot_len={:<8} rel={}",
                    line.offset, line.rmgr, line.op, line.header.len, line.header.tot_len, rel
                ),
                Some(e) => println!(
                    "off={:<10} {:<14} {:<34} ERROR: {}",
                    line.offset, line.rmgr, line.op, e
                ),
            }
        }
    }

    if json {
        // check_header метрики не обновляет
        if !header_only {
            println!("{}", serde_json::to_string(&metrics::snapshot())?);
        }
    } else {
        println!("records: {}, rejected: {}", total, failed);
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} records failed validation", failed, total));
    }
    Ok(())
}

#[derive(Serialize)]
struct FilterLine {
    offset: usize,
    relation: Option<RelFileNode>,
    decision: FilterDecision,
}

pub fn cmd_filter(input: &Path, page_size: Option<u32>, databases: Vec<u32>, json: bool) -> Result<()> {
    let interp = interpreter(page_size)?;
    let filter = RelationFilter::new(databases);
    let bytes = read_input(input)?;

    let (mut pass, mut drop) = (0usize, 0usize);
    for item in RecordDump::new(&bytes) {
        let (offset, buf) = item?;
        // первая ошибка формата прерывает проход
        let verdict = interp
            .interpret(buf)
            .with_context(|| format!("record at offset {}", offset))?;
        let decision = filter.decide(&verdict);
        match decision {
            FilterDecision::Pass => pass += 1,
            FilterDecision::Drop => drop += 1,
        }

        if json {
            let line = FilterLine {
                offset,
                relation: verdict.relation,
                decision,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!(
                "off={:<10} {:<4} rel={}",
                offset,
                match decision {
                    FilterDecision::Pass => "pass",
                    FilterDecision::Drop => "drop",
                },
                verdict
                    .relation
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
    }

    if !json {
        println!("pass: {}, drop: {}", pass, drop);
    }
    Ok(())
}

pub fn cmd_rmgr(json: bool) -> Result<()> {
    let book = codebook();
    if json {
        println!("{}", serde_json::to_string_pretty(&book)?);
        return Ok(());
    }
    for e in &book {
        let class = match e.class {
            ManagerClass::NoRelation => "no relation",
            ManagerClass::Opcodes => "opcodes",
            ManagerClass::Unsupported => "unsupported",
        };
        match e.mask {
            Some(mask) => println!("{:>2} {:<14} {} (mask 0x{:02X})", e.id, e.manager, class, mask),
            None => println!("{:>2} {:<14} {}", e.id, e.manager, class),
        }
        for op in &e.opcodes {
            println!("     0x{:02X} {:<36} {:?}", op.code, op.name, op.site);
        }
    }
    Ok(())
}

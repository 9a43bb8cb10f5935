mod config;
mod quota;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use uid_core::{BatchReport, BatchScheduler, DocumentPipeline, Engines, ProcessedQuota, RedactConfig};
use uid_ocr::{get_tesseract_langs, TesseractEngine};
use uid_pdf::PdfiumRasterizer;
use uid_verify::{CommandDetector, DisabledDetector, ObjectDetector};

use crate::quota::JsonQuotaStore;

const DEFAULT_QUOTA_FILE: &str = "uid_quota.json";

/// 扫描证件中 12 位身份号码的批量检测与遮盖工具
#[derive(Parser, Debug)]
#[command(name = "uid-redact", version, about)]
struct Cli {
    /// 输出调试日志
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 批量处理目录下的图片和 PDF
    Run {
        /// 输入目录
        #[arg(long)]
        input: PathBuf,

        /// 输出目录，结果命名为 `原名_masked.扩展名`
        #[arg(long)]
        output: PathBuf,

        /// JSON 配置文件
        #[arg(long)]
        config: Option<PathBuf>,

        /// 配额计数文件
        #[arg(long, default_value = DEFAULT_QUOTA_FILE)]
        quota_file: PathBuf,

        /// worker 数量，覆盖配置
        #[arg(long)]
        workers: Option<usize>,

        /// 将处理结果写入 JSON 报告
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// 检查 Tesseract 是否可用
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// 查看或重置配额计数
    Quota {
        #[arg(long, default_value = DEFAULT_QUOTA_FILE)]
        quota_file: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        /// 将计数清零
        #[arg(long, default_value_t = false)]
        reset: bool,
    },

    /// 写出默认配置文件
    InitConfig {
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Command::Run {
            input,
            output,
            config,
            quota_file,
            workers,
            report,
        } => run(&input, &output, config.as_deref(), &quota_file, workers, report.as_deref()),
        Command::Check { config } => check(config.as_deref()),
        Command::Quota {
            quota_file,
            config,
            reset,
        } => show_quota(&quota_file, config.as_deref(), reset),
        Command::InitConfig { config } => {
            config::save_config(&config, &RedactConfig::default())
                .with_context(|| format!("写入配置失败: {}", config.display()))?;
            println!("已写入默认配置: {}", config.display());
            Ok(())
        }
    }
}

fn load(config: Option<&Path>) -> Result<RedactConfig> {
    config::load_config(config).context("读取配置失败")
}

fn build_detector(config: &RedactConfig) -> Arc<dyn ObjectDetector> {
    let Some(command) = &config.detector.command else {
        return Arc::new(DisabledDetector);
    };
    Arc::new(CommandDetector::new(
        command.clone(),
        config.detector.args.clone(),
        config.identifier_label.clone(),
    ))
}

fn run(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    quota_file: &Path,
    workers: Option<usize>,
    report_path: Option<&Path>,
) -> Result<()> {
    let mut config = load(config)?;
    if workers.is_some() {
        config.workers = workers;
    }

    let work_dir = config.work_dir_or_default();
    let tesseract = TesseractEngine::new(config.tesseract.clone())
        .context("Tesseract 不可用，请检查 tesseract.binaryPath")?
        .with_work_dir(&work_dir);

    let engines = Engines {
        text: Arc::new(tesseract),
        detector: build_detector(&config),
        rasterizer: Arc::new(PdfiumRasterizer::new(config.pdf_dpi)),
    };
    let pipeline = DocumentPipeline::new(&config, &engines);
    log::info!("[Batch] 未处理目录: {}", pipeline.unprocessed_dir().display());

    let quota = ProcessedQuota::new(Arc::new(JsonQuotaStore::new(quota_file)), config.quota_ceiling);
    let scheduler = BatchScheduler::new(Arc::new(pipeline), quota, config.worker_count());

    let report = scheduler
        .run_batch(input, output)
        .with_context(|| format!("批处理失败: {}", input.display()))?;

    print_summary(&report);

    if let Some(path) = report_path {
        let raw = serde_json::to_string_pretty(&report)?;
        fs::write(path, raw).with_context(|| format!("写入报告失败: {}", path.display()))?;
        println!("报告: {}", path.display());
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!(
        "处理 {} 个：遮盖 {}，未处理 {}，失败 {}",
        report.attempted(),
        report.redacted(),
        report.unprocessed(),
        report.failed()
    );
    if report.skipped_by_quota > 0 {
        println!("超出配额跳过 {} 个", report.skipped_by_quota);
    }
    for result in report.results.iter().filter(|r| r.reason.is_some()) {
        println!(
            "  {:?} {}: {}",
            result.outcome,
            result.input.display(),
            result.reason.as_deref().unwrap_or_default()
        );
    }
    println!("配额: {}", report.quota_used);
}

fn check(config: Option<&Path>) -> Result<()> {
    let config = load(config)?;
    let engine = TesseractEngine::new(config.tesseract.clone()).context("Tesseract 不可用")?;
    let langs = get_tesseract_langs(
        config.tesseract.binary_or_default(),
        config.tesseract.tessdata_path.as_deref(),
    )
    .context("获取语言列表失败")?;

    println!("{}", serde_json::to_string_pretty(&engine.params())?);
    println!("可用语言: {}", langs.join(", "));

    let lang = config.tesseract.lang_or_default();
    let missing: Vec<&str> = lang.split('+').filter(|l| !langs.iter().any(|a| a.as_str() == *l)).collect();
    anyhow::ensure!(missing.is_empty(), "缺少语言包: {}", missing.join(", "));

    match &config.detector.command {
        Some(command) => println!("检测程序: {}", command),
        None => println!("检测程序: 未配置，跳过视觉复核"),
    }
    Ok(())
}

fn show_quota(quota_file: &Path, config: Option<&Path>, reset: bool) -> Result<()> {
    let config = load(config)?;
    let store = JsonQuotaStore::new(quota_file);
    println!("配额文件: {}", store.path().display());
    let quota = ProcessedQuota::new(Arc::new(store), config.quota_ceiling);
    if reset {
        quota.reset().context("重置配额失败")?;
    }
    println!(
        "已处理 {}/{}，剩余 {}",
        quota.used()?,
        quota.ceiling(),
        quota.remaining()?
    );
    Ok(())
}

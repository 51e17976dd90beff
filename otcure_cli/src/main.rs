use chrono::Local;
use clap::{Parser, Subcommand};
use otcure_core::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "otcure")]
#[command(about = "Over-the-counter medication dose tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the medication catalog grouped by class
    Catalog,

    /// Analyse a single dose without starting a session
    Check {
        /// Medication identifiers
        #[arg(required = true)]
        ids: Vec<String>,

        /// Age used for eligibility checks
        #[arg(long, default_value_t = 30)]
        age: u32,

        /// Pregnancy status (none, pregnant, breastfeeding)
        #[arg(long, default_value = "none")]
        pregnancy: String,

        /// Ingredient to exclude (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive tracking session (default)
    Session,

    /// Manage the configuration file
    Config {
        /// Write the default configuration
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Read-only data shared by every command
struct Context {
    catalog: &'static Catalog,
    rules: RuleSet,
    limits: IngredientLimits,
    config: Config,
}

fn main() -> Result<()> {
    // Initialize logging
    otcure_core::logging::init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_config_path);

    if let Some(Commands::Config { init, force }) = cli.command {
        return cmd_config(&config_path, init, force);
    }

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let ctx = Context {
        catalog,
        rules: config.rule_set()?,
        limits: config.effective_limits(&catalog.limits),
        config,
    };

    match cli.command {
        Some(Commands::Catalog) => cmd_catalog(&ctx),
        Some(Commands::Check {
            ids,
            age,
            pregnancy,
            exclude,
            json,
        }) => cmd_check(&ctx, ids, age, &pregnancy, exclude, json),
        Some(Commands::Session) | None => {
            let stdin = io::stdin();
            cmd_session(&ctx, &mut stdin.lock())
        }
        Some(Commands::Config { .. }) => Ok(()),
    }
}

fn cmd_config(path: &Path, init: bool, force: bool) -> Result<()> {
    if !init {
        println!("Config path: {}", path.display());
        return Ok(());
    }

    if path.exists() && !force {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }

    let config = Config {
        rules: Some(default_rule_set()?.rules().to_vec()),
        ..Config::default()
    };
    config.save_to(path)?;
    println!("✓ Wrote default config to {}", path.display());
    Ok(())
}

fn cmd_catalog(ctx: &Context) -> Result<()> {
    let ids: Vec<&str> = list_catalog(ctx.catalog)
        .into_iter()
        .map(|med| med.id.as_str())
        .collect();

    for (class, meds) in ctx.catalog.group_by_class(&ids) {
        println!("\n#### {} ({}개)", class, meds.len());
        for med in meds {
            display_medication(med);
        }
    }

    println!("\n일일 최대 복용량:");
    for (ingredient, limit) in ctx.limits.iter() {
        println!("  - {}: {}", ingredient, format_mg(*limit));
    }
    Ok(())
}

fn display_medication(med: &Medication) {
    println!("  {}", med.id);
    println!("    설명: {}", med.description);
    println!("    복용 방법: {}", med.usage);
    let ingredients: Vec<String> = med
        .ingredients
        .iter()
        .map(|(name, mg)| format!("{} {}", name, format_mg(*mg)))
        .collect();
    println!("    주요 성분: {}", ingredients.join(", "));
    if let Some(ref group) = med.effect_group {
        println!("    작용 그룹: {}", group);
    }
    if med.pregnancy_risk != PregnancyRisk::None {
        println!("    임신/수유: {:?}", med.pregnancy_risk);
    }
    if med.age_risk != AgeRisk::None {
        println!("    고령자: {:?}", med.age_risk);
    }
    if let Some(ref url) = med.reference_url {
        println!("    ℹ 참고: {}", url);
    }
}

/// Everything rendered for a single-dose selection
#[derive(Serialize)]
struct DoseReport {
    annotations: BTreeMap<String, Eligibility>,
    totals: IngredientTotals,
    duplicates: IngredientSources,
    warnings: Vec<Warning>,
}

fn build_report<S: AsRef<str>>(ctx: &Context, session: &Session, ids: &[S]) -> Result<DoseReport> {
    let summary = session.aggregate_single_dose(ctx.catalog, ids)?;
    let warnings = session.evaluate_warnings(ctx.catalog, &ctx.rules, ids)?;
    let duplicates = summary.duplicates();

    Ok(DoseReport {
        annotations: session.selectable_annotations(ctx.catalog),
        totals: summary.totals,
        duplicates,
        warnings,
    })
}

fn cmd_check(
    ctx: &Context,
    ids: Vec<String>,
    age: u32,
    pregnancy: &str,
    exclude: Vec<String>,
    json: bool,
) -> Result<()> {
    let profile = UserProfile::from_form(ProfileForm {
        name: "check".into(),
        age: Some(age),
        gender: Some(Gender::Other),
        pregnancy: pregnancy.parse()?,
    })?;
    let session = Session::new(profile)
        .with_excluded(ctx.config.session.excluded_ingredients.iter().cloned())
        .with_excluded(exclude);

    let report = build_report(ctx, &session, &ids)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_report(&report);
    }
    Ok(())
}

fn display_report(report: &DoseReport) {
    for warning in &report.warnings {
        let marker = match warning.severity {
            Severity::Error => "🚨",
            Severity::Warning => "⚠️",
        };
        println!("{} [{}] {}", marker, warning.severity, warning.message);
    }

    if !report.duplicates.is_empty() {
        println!("🚨 중복 성분 경고: 동일한 유효 성분을 중복 섭취합니다.");
        for (ingredient, sources) in &report.duplicates {
            println!("  - {} 성분: {}에 모두 포함됨", ingredient, sources.join(", "));
        }
    }

    println!("\n성분별 총 섭취량 (1회분 기준)");
    if report.totals.is_empty() {
        println!("  선택된 약물이 없습니다.");
    }
    for (ingredient, total) in &report.totals {
        if report.duplicates.contains_key(ingredient) {
            println!("  - {}: {} (중복 합산됨)", ingredient, format_mg(*total));
        } else {
            println!("  - {}: {}", ingredient, format_mg(*total));
        }
    }
}

fn display_annotations(ctx: &Context, session: &Session) {
    for (id, eligibility) in session.selectable_annotations(ctx.catalog) {
        match (eligibility.allowed, eligibility.reason) {
            (true, None) => println!("  [ ] {}", id),
            (true, Some(reason)) => println!("  [ ] {} ({})", id, reason),
            (false, reason) => println!(
                "  [x] {} (선택 불가: {})",
                id,
                reason.map(|r| r.to_string()).unwrap_or_default()
            ),
        }
    }
}

fn display_exclusions(session: &Session) {
    if session.excluded().is_empty() {
        println!("제외된 성분이 없습니다.");
        return;
    }
    let excluded: Vec<&str> = session.excluded().iter().map(String::as_str).collect();
    println!("제외된 성분: {}", excluded.join(", "));
}

/// Prompt for one line; `None` on end of input
fn prompt<R: BufRead>(input: &mut R, label: &str) -> Result<Option<String>> {
    print!("{}> ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Collect a profile, re-asking until the form validates
fn read_profile<R: BufRead>(input: &mut R) -> Result<Option<UserProfile>> {
    println!("프로필을 입력하세요.");
    loop {
        let Some(name) = prompt(input, "이름")? else {
            return Ok(None);
        };
        let Some(age) = prompt(input, "나이")? else {
            return Ok(None);
        };
        let Some(gender) = prompt(input, "성별 (male/female/other)")? else {
            return Ok(None);
        };
        let Some(pregnancy) = prompt(input, "임신/수유 (none/pregnant/breastfeeding)")? else {
            return Ok(None);
        };

        let form = ProfileForm {
            name,
            age: age.parse().ok(),
            gender: gender.parse().ok(),
            pregnancy: match pregnancy.parse() {
                Ok(status) => status,
                Err(e) => {
                    println!("✗ {}", e);
                    continue;
                }
            },
        };

        match UserProfile::from_form(form) {
            Ok(profile) => return Ok(Some(profile)),
            Err(e) => println!("✗ {}", e),
        }
    }
}

fn split_ids(args: &str) -> Vec<String> {
    args.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

fn print_help() {
    println!("명령어:");
    println!("  list                 약물 목록과 선택 가능 여부");
    println!("  select <약,약,...>   복용할 약물 선택 및 분석");
    println!("  commit [메모]        선택한 약물을 복용 기록에 추가");
    println!("  log                  오늘의 복용 기록");
    println!("  totals               오늘의 성분별 누적 섭취량");
    println!("  exclude <성분>       성분 제외");
    println!("  include <성분>       성분 제외 해제");
    println!("  excluded             제외된 성분 목록");
    println!("  quit                 종료");
}

fn cmd_session<R: BufRead>(ctx: &Context, input: &mut R) -> Result<()> {
    let Some(profile) = read_profile(input)? else {
        return Ok(());
    };
    let mut session = Session::new(profile)
        .with_excluded(ctx.config.session.excluded_ingredients.iter().cloned());
    println!("✓ {}님의 세션을 시작합니다.", session.profile().name);
    display_exclusions(&session);

    let mut selected: Vec<String> = Vec::new();
    print_help();

    while let Some(line) = prompt(input, "")? {
        let (command, args) = match line.split_once(' ') {
            Some((command, args)) => (command, args.trim()),
            None => (line.as_str(), ""),
        };

        match command {
            "" => continue,
            "list" => display_annotations(ctx, &session),
            "select" => {
                let ids = split_ids(args);
                match build_report(ctx, &session, &ids) {
                    Ok(report) => {
                        display_report(&report);
                        selected = ids;
                    }
                    Err(e) => println!("✗ {}", e),
                }
            }
            "commit" => {
                let now = Local::now().naive_local();
                match session.commit_dose(ctx.catalog, &ctx.limits, &selected, now, args) {
                    Ok(accepted) => {
                        println!(
                            "✓ 복용 기록 완료 ({})",
                            accepted.entry.time.format("%H:%M")
                        );
                        selected.clear();
                    }
                    Err(Error::DoseLimitExceeded(exceeded)) => {
                        println!("✗ 1일 최대 복용량을 초과하여 기록할 수 없습니다.");
                        for item in exceeded {
                            println!(
                                "  - {}: {} / 최대 {}",
                                item.ingredient,
                                format_mg(item.total_mg),
                                format_mg(item.limit_mg)
                            );
                        }
                    }
                    Err(e) => println!("✗ {}", e),
                }
            }
            "log" => {
                let today = Local::now().date_naive();
                let entries = session.todays_log(today);
                if entries.is_empty() {
                    println!("오늘의 복용 기록이 없습니다.");
                }
                for entry in entries {
                    println!(
                        "  {} {} {}",
                        entry.time.format("%H:%M"),
                        entry.medication_ids.join(", "),
                        entry.note
                    );
                }
            }
            "totals" => {
                let today = Local::now().date_naive();
                let totals = session.todays_ingredient_totals(ctx.catalog, today);
                if totals.is_empty() {
                    println!("오늘의 복용 기록이 없습니다.");
                }
                for (ingredient, total) in totals {
                    match ctx.limits.get(&ingredient) {
                        Some(limit) => println!(
                            "  - {}: {} / 최대 {}",
                            ingredient,
                            format_mg(total),
                            format_mg(limit)
                        ),
                        None => println!("  - {}: {}", ingredient, format_mg(total)),
                    }
                }
            }
            "exclude" if !args.is_empty() => {
                session.exclude_ingredient(args);
                println!("✓ '{}' 성분을 제외합니다.", args);
            }
            "include" if !args.is_empty() => {
                session.include_ingredient(args);
                println!("✓ '{}' 성분 제외를 해제합니다.", args);
            }
            "excluded" => display_exclusions(&session),
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("알 수 없는 명령어: {} ('help' 참고)", other),
        }
    }

    Ok(())
}

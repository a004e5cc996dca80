use clap::{Arg, ArgAction, Command};
use tracing::{error, info};

use combatai::logging::{self, LogConfig, LogOutput};
use combatai::scenario::ScenarioConfig;
use combatai::simulation::SimulationEngine;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("combatai")
        .version("0.1.0")
        .about("操縦AIシミュレーション (Combat AI Simulation)")
        .long_about("地上・母艦ユニットの操縦AIシミュレーション\n\
                     接触リストからの目標選定、兵装・シールド管理、飛行隊の発艦を評価します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .value_parser(|s: &str| s.parse::<LogOutput>())
                .help("ログ出力先 (console, file, both)")
        )
        .get_matches();

    println!("操縦AIシミュレーション (Combat AI Simulation) - combatai v0.1.0");
    println!();

    let verbose_level = matches.get_count("verbose");

    let log_config = LogConfig {
        level: matches
            .get_one::<String>("log-level")
            .map(|s| logging::parse_log_level(s))
            .unwrap_or_else(|| logging::level_for_verbosity(verbose_level)),
        output: matches
            .get_one::<LogOutput>("log-output")
            .copied()
            .unwrap_or(LogOutput::Console),
        ..LogConfig::default()
    };

    // ファイル出力のガードは終了まで保持する
    let _guard = match logging::init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };

    let Some(scenario_path) = matches.get_one::<String>("scenario") else {
        show_default_help();
        return;
    };

    match run_scenario(scenario_path, matches.get_flag("info"), verbose_level) {
        Ok(_) => {
            if verbose_level > 0 {
                info!("シナリオ実行が正常に完了しました。");
            }
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(
    scenario_path: &str,
    info_only: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;

    if verbose_level > 0 {
        info!("シナリオファイル読み込み完了: {}", scenario_path);
    }

    scenario.print_summary();
    if info_only {
        return Ok(());
    }
    println!();

    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize()?;
    simulation.run()?;

    println!();
    simulation.print_summary();

    Ok(())
}

fn show_default_help() {
    println!("使用方法:");
    println!("  combatai [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>    シナリオファイルを指定して実行");
    println!("  -i, --info               シナリオ情報のみ表示");
    println!("  -v, --verbose            詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-level <LEVEL>  ログレベル");
    println!("      --log-output <OUT>   ログ出力先 (console, file, both)");
    println!("  -h, --help               このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/ground_defense.yaml  - 地上防空陣地と母艦の迎撃");
    println!();
    println!("例:");
    println!("  combatai -s scenarios/ground_defense.yaml");
    println!("  combatai -s scenarios/ground_defense.yaml -vv --log-output both");
    println!("  combatai -s scenarios/ground_defense.yaml -i");
}

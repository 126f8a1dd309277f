use std::path::{Path, PathBuf};

use clap::{value_parser, Arg, Command};
use tracing::{error, info};

use windsim::logging::{init_logging, level_from_verbosity, parse_log_level, LogConfig, LogOutput};
use windsim::scenario::ScenarioConfig;
use windsim::simulation::{FrameSnapshot, SimulationEngine};

fn main() {
    let matches = Command::new("windsim")
        .version("0.1.0")
        .about("風粒子シミュレーション (Wind Particle Simulation)")
        .long_about("ファサードを回避しながら目標点へ向かう風粒子の\n\
                     エージェントベースシミュレーションを実行します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、組み込みの既定シナリオで実行されます。")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("particles")
                .short('n')
                .long("particles")
                .value_name("COUNT")
                .value_parser(value_parser!(usize))
                .help("粒子数を上書き")
        )
        .arg(
            Arg::new("frames")
                .short('f')
                .long("frames")
                .value_name("FRAMES")
                .value_parser(value_parser!(u64))
                .help("実行フレーム数を上書き")
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .value_parser(value_parser!(u64))
                .help("乱数シードを上書き")
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("最終フレームのスナップショットをYAMLで書き出す")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: DEBUG, -vv: TRACE)")
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
                .value_name("TARGET")
                .value_parser(|s: &str| s.parse::<LogOutput>())
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .get_matches();

    let level = match matches.get_one::<String>("log-level") {
        Some(level) => parse_log_level(level),
        None => level_from_verbosity(matches.get_count("verbose")),
    };
    let log_config = LogConfig {
        level,
        output: matches.get_one::<LogOutput>("log-output").copied().unwrap_or(LogOutput::Console),
        ..LogConfig::default()
    };
    let _guard = match init_logging(log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ログ初期化エラー: {}", e);
            None
        }
    };

    let overrides = Overrides {
        particles: matches.get_one::<usize>("particles").copied(),
        frames: matches.get_one::<u64>("frames").copied(),
        seed: matches.get_one::<u64>("seed").copied(),
        output: matches.get_one::<String>("output").map(PathBuf::from),
    };

    let result = run(
        matches.get_one::<String>("scenario").map(String::as_str),
        matches.get_flag("info"),
        overrides,
    );

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

/// コマンドラインからの上書き設定
struct Overrides {
    particles: Option<usize>,
    frames: Option<u64>,
    seed: Option<u64>,
    output: Option<PathBuf>,
}

/// シナリオを読み込んで実行
fn run(scenario_path: Option<&str>, info_only: bool, overrides: Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let mut scenario = match scenario_path {
        Some(path) => {
            let scenario = ScenarioConfig::from_file(path)?;
            info!("シナリオファイル読み込み完了: {}", path);
            scenario
        }
        None => ScenarioConfig::builtin(),
    };

    if let Some(particles) = overrides.particles {
        scenario.sim.particle_count = particles;
    }
    if let Some(frames) = overrides.frames {
        scenario.sim.frames = frames;
    }
    if let Some(seed) = overrides.seed {
        scenario.sim.seed = seed;
    }
    scenario.validate()?;

    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    execute_scenario(&scenario, overrides.output)
}

/// シナリオの実行
fn execute_scenario(scenario: &ScenarioConfig, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = SimulationEngine::from_scenario(scenario)?;

    let output_path = output.or_else(|| scenario.output.as_ref().map(|o| PathBuf::from(&o.path)));
    let every = scenario.output.as_ref().and_then(|o| o.every_n_frames);

    match (&output_path, every) {
        (Some(path), Some(every)) => {
            // 間隔ごとに書き出しながら実行
            let frames = scenario.sim.frames;
            let mut done = 0;
            while done < frames {
                let chunk = every.min(frames - done);
                engine.run(chunk);
                done += chunk;
                if done % every == 0 {
                    write_snapshot(&numbered_path(path, done), &engine.snapshot())?;
                }
            }
        }
        _ => engine.run(scenario.sim.frames),
    }

    if let Some(path) = &output_path {
        write_snapshot(path, &engine.snapshot())?;
    }

    Ok(())
}

fn numbered_path(path: &Path, frame: u64) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("yaml");
    path.with_file_name(format!("{}_{:05}.{}", stem, frame, ext))
}

fn write_snapshot(path: &Path, snapshot: &FrameSnapshot) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, snapshot.to_yaml()?)?;
    info!("スナップショットを書き出し: {} (フレーム {})", path.display(), snapshot.frame);
    Ok(())
}

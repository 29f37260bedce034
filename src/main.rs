use anyhow::Context;
use clap::Parser;
use shot_emotion::analyzer::{CacheFile, CachedAnalyzer, DeepFaceAnalyzer};
use shot_emotion::cli::{Cli, Commands};
use shot_emotion::config::Config;
use shot_emotion::error::ShotEmotionError;
use shot_emotion::pipeline::{run_pipeline, PipelineOptions};
use shot_emotion::{export, probe, scanner};
use shot_emotion_common::{
    frequency_counts, merge_by_shot, EmotionScale, ResultTable, UnknownLabelPolicy,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "shot_emotion=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// 出力パスからチャートの置き場所を決める
fn chart_dir_for(output: &Path) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.to_path_buf()
    } else {
        match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// 頻度チャートの棒の並び（左から順）
fn print_frequency_legend(table: &ResultTable) {
    for (i, (label, count)) in frequency_counts(table).into_iter().enumerate() {
        println!("  {:>2}. {:<10} {}", i + 1, label, count);
    }
}

/// 推移チャートの縦軸（PNGには文字を描かないので凡例を出力）
fn print_scale_legend(policy: UnknownLabelPolicy) {
    let legend: Vec<String> = EmotionScale
        .ticks(policy)
        .into_iter()
        .map(|(ordinal, label)| format!("{}={}", ordinal, label))
        .collect();
    println!("  縦軸: {}", legend.join(", "));
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load().context("設定の読み込みに失敗")?;

    match cli.command {
        Commands::Detect {
            folder,
            output,
            format,
            charts_dir,
            no_charts,
            use_cache,
            merge_shots,
            fps,
            detector_backend,
            face_selection,
            enforce_detection,
            title,
        } => {
            println!("🎬 shot-emotion - キーフレーム感情解析\n");

            let mut config = config;
            if let Some(fps) = fps {
                config.fps = fps;
            }
            if let Some(backend) = detector_backend {
                config.detector_backend = backend;
            }
            if let Some(selection) = face_selection {
                config.face_selection = selection;
            }
            config.enforce_detection |= enforce_detection;
            config.validate()?;

            // 1. Discover
            println!("[1/4] キーフレームを探索中...");
            let keyframes = scanner::discover_keyframes(&folder, &config.keyframe_glob)?;
            println!("✔ {}枚のキーフレームを検出\n", keyframes.len());
            if cli.verbose {
                for path in keyframes.iter().take(5) {
                    println!("  {}", path.display());
                }
            }

            // 2. Analyze
            println!(
                "[2/4] 感情解析中... (検出器: {}, 顔の選択: {}){}",
                config.detector_backend,
                config.face_selection,
                if use_cache { " (キャッシュ有効)" } else { "" }
            );
            let options = PipelineOptions {
                fps: config.fps,
                show_progress: true,
                verbose: cli.verbose,
            };
            let base = DeepFaceAnalyzer::from_config(&config, cli.verbose)?;
            let run = if use_cache {
                let mut cached = CachedAnalyzer::new(base, CacheFile::load(&folder));
                let run = run_pipeline(&keyframes, &mut cached, &options);
                println!("  キャッシュ: ヒット {}件 / 解析 {}件", cached.hits(), cached.misses());
                if let Err(e) = cached.into_cache().save(&folder) {
                    tracing::warn!(error = %e, "キャッシュの保存に失敗");
                }
                run
            } else {
                let mut analyzer = base;
                run_pipeline(&keyframes, &mut analyzer, &options)
            };

            let summary = run.summary();
            println!(
                "✔ 解析完了: 検出 {} / 顔なし {} / 失敗 {} / スキップ {}\n",
                summary.detected, summary.no_detection, summary.failed, summary.skipped
            );

            let report_path = chart_dir_for(&output).join(format!("{}_report.json", title));
            export::report::RunReport::from_run(&run, config.fps, &config.detector_backend)
                .save(&report_path)?;
            if cli.verbose {
                println!("  レポート: {}", report_path.display());
            }

            let mut table = run.table();
            if merge_shots {
                table = merge_by_shot(&table);
                println!("  ショット単位に集約: {}行", table.len());
            }

            // 3. Persist
            println!("[3/4] 結果を保存中...");
            export::export_results(&table, &format, &output, &title, config.unknown_labels)?;

            // 4. Charts
            if no_charts {
                println!("[4/4] チャート生成をスキップ");
            } else {
                println!("[4/4] チャートを生成中...");
                let dir = charts_dir.unwrap_or_else(|| chart_dir_for(&output));
                for path in export::chart::render_charts(&table, &dir, config.unknown_labels)? {
                    println!("✔ チャート出力: {}", path.display());
                }
                println!("  頻度（棒の並び順）:");
                print_frequency_legend(&table);
                print_scale_legend(config.unknown_labels);
            }

            println!("\n✅ 完了（{}行）", table.len());
        }

        Commands::Charts {
            input,
            output,
            unknown_labels,
        } => {
            println!("📊 shot-emotion - チャート生成\n");

            let table = export::csv::read_csv(&input)?;
            println!("✔ {}行を読み込み", table.len());

            let policy = unknown_labels.unwrap_or(config.unknown_labels);
            let dir = output.unwrap_or_else(|| chart_dir_for(&input));
            for path in export::chart::render_charts(&table, &dir, policy)? {
                println!("✔ チャート出力: {}", path.display());
            }
            println!("  頻度（棒の並び順）:");
            print_frequency_legend(&table);
            print_scale_legend(policy);

            println!("\n✅ 完了");
        }

        Commands::Probe {
            video,
            output,
            frame_at,
            no_audio,
            no_waveform,
        } => {
            println!("🎞 shot-emotion - 動画解析\n");

            if !video.is_file() {
                return Err(ShotEmotionError::FileNotFound(video.display().to_string()).into());
            }
            let tools = probe::MediaTools::locate()?;
            let meta = tools
                .probe(&video)
                .with_context(|| format!("動画を読み込めません: {}", video.display()))?;

            println!("動画メタデータ:");
            println!("  長さ: {:.2}秒", meta.duration_secs);
            println!("  FPS: {:.2}", meta.fps);
            println!("  解像度: {} × {}", meta.width, meta.height);
            match (meta.audio_sample_rate, meta.audio_channels) {
                (Some(rate), channels) if meta.has_audio => {
                    println!("  音声: {} Hz, {}ch", rate, channels.unwrap_or(0));
                }
                _ if meta.has_audio => println!("  音声: あり"),
                _ => println!("  音声: なし"),
            }
            println!();

            let stem = video
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "video".to_string());

            if meta.duration_secs > 0.0 && frame_at > meta.duration_secs {
                anyhow::bail!(
                    "指定時刻 {:.2}秒 は動画の長さ {:.2}秒 を超えています",
                    frame_at,
                    meta.duration_secs
                );
            }
            let frame_path = output.join(format!("{}_frame_{:.2}s.jpg", stem, frame_at));
            tools.extract_frame(&video, frame_at, &frame_path)?;
            println!("✔ フレーム出力: {}", frame_path.display());

            if no_audio {
                println!("- 音声抽出をスキップ");
            } else if !meta.has_audio {
                println!("- 音声トラックがありません");
            } else {
                let audio_path = output.join(format!("{}_audio.wav", stem));
                tools.extract_audio(&video, &audio_path)?;
                println!("✔ 音声出力: {}", audio_path.display());

                if !no_waveform {
                    let samples = tools.decode_mono_pcm(&audio_path)?;
                    println!(
                        "  {}サンプル, {} Hz, {:.2}秒",
                        samples.len(),
                        probe::WAVEFORM_SAMPLE_RATE,
                        samples.len() as f64 / probe::WAVEFORM_SAMPLE_RATE as f64
                    );
                    let wave_path =
                        output.join(format!("{}{}", stem, export::chart::WAVEFORM_FILE_SUFFIX));
                    export::chart::render_waveform_png(&samples, &wave_path)?;
                    println!("✔ 波形出力: {}", wave_path.display());
                }
            }

            println!("\n✅ 完了");
        }

        Commands::Config {
            set_fps,
            set_detector_backend,
            set_python,
            set_face_selection,
            show,
        } => {
            let mut config = config;
            let mut changed = false;

            if let Some(fps) = set_fps {
                config.fps = fps;
                changed = true;
            }
            if let Some(backend) = set_detector_backend {
                config.detector_backend = backend;
                changed = true;
            }
            if let Some(python) = set_python {
                config.python = python;
                changed = true;
            }
            if let Some(selection) = set_face_selection {
                config.face_selection = selection;
                changed = true;
            }

            if changed {
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show || !changed {
                println!("設定:");
                println!("  fps: {}", config.fps);
                println!("  キーフレーム: {}", config.keyframe_glob);
                println!("  検出器: {}", config.detector_backend);
                println!("  enforce_detection: {}", config.enforce_detection);
                println!("  顔の選択: {}", config.face_selection);
                println!("  未知ラベル: {}", config.unknown_labels);
                match &config.analyzer_command {
                    Some(cmd) => println!("  解析コマンド: {}", cmd.join(" ")),
                    None => println!("  解析コマンド: {} (組み込みDeepFaceランナー)", config.python),
                }
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("outputs/shots"));
            let cache_path = CacheFile::cache_path(&target);

            if info || !clear {
                if cache_path.exists() {
                    let cache = CacheFile::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match CacheFile::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}

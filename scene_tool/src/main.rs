use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

use stereo_engine::config::Config;
use stereo_engine::core::config::EditorConfig;
use stereo_engine::foundation::math::Vec2;
use stereo_engine::picking::Modifiers;
use stereo_engine::primitive::PrimitiveKind;
use stereo_engine::render::{Camera, RenderQueue};
use stereo_engine::builders::{Tool, ToolController};
use stereo_engine::scene::Scene;
use stereo_engine::serialization::{load_scene, save_scene};

fn main() -> Result<()> {
    stereo_engine::foundation::logging::init_with_default("info");

    let matches = Command::new("scene_tool")
        .about("Inspects and generates stereometry scene files")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Editor configuration (.toml or .ron)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("inspect")
                .about("Load a scene file and print a summary")
                .arg(Arg::new("file").required(true).value_name("FILE")),
        )
        .subcommand(
            Command::new("demo-cube")
                .about("Build a box with the rect tool and save it")
                .arg(Arg::new("file").required(true).value_name("FILE")),
        )
        .get_matches();

    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("inspect", args)) => inspect(file_arg(args)?, config),
        Some(("demo-cube", args)) => demo_cube(file_arg(args)?, config),
        _ => Err(anyhow::anyhow!("Unknown command")),
    }
}

fn load_config(matches: &ArgMatches) -> Result<EditorConfig> {
    let Some(path) = matches.get_one::<String>("config") else {
        return Ok(EditorConfig::default());
    };
    let config = EditorConfig::load_from_file(path).with_context(|| format!("Failed to load config {}", path))?;
    config.validate().context("Invalid editor configuration")?;
    log::info!("Using configuration from {}", path);
    Ok(config)
}

fn file_arg(args: &ArgMatches) -> Result<PathBuf> {
    args.get_one::<String>("file")
        .map(PathBuf::from)
        .context("Missing file argument")
}

fn inspect(path: PathBuf, config: EditorConfig) -> Result<()> {
    let loaded = load_scene(&path, config).with_context(|| format!("Failed to load {}", path.display()))?;
    let mut camera = Camera::default();
    loaded.apply_camera(&mut camera)?;
    let scene = &loaded.scene;

    println!("Scene: {}", path.display());
    println!("Camera: translation {} rotation {}", loaded.camera.translation, loaded.camera.rotation);
    println!("Objects: {}", scene.len());
    for kind in PrimitiveKind::ALL {
        let count = scene.count_of(kind);
        if count > 0 {
            println!("  {:<9} {}", kind, count);
        }
    }

    let stats = scene.arena().stats();
    println!(
        "Arena: {} blocks, {} / {} vertices used ({} released)",
        stats.blocks, stats.used_vertices, stats.capacity_vertices, stats.released_vertices
    );
    let queue = RenderQueue::build(scene, &camera);
    println!("Draw calls: {} batched, {} per-object", queue.batches().len(), queue.commands().len());
    Ok(())
}

fn demo_cube(path: PathBuf, config: EditorConfig) -> Result<()> {
    let mut scene = Scene::new(config);
    let camera = Camera::default();
    let mut tools = ToolController::new();

    tools.set_tool(&mut scene, Tool::Rect)?;
    tools.click(&mut scene, &camera, Vec2::new(640.0, 360.0), Modifiers::empty())?;
    let completed = tools.click(&mut scene, &camera, Vec2::new(820.0, 200.0), Modifiers::empty())?;
    if !completed {
        return Err(anyhow::anyhow!("Rect tool did not complete a box"));
    }
    scene.deselect_all();

    save_scene(&scene, camera.settings(), &path).with_context(|| format!("Failed to save {}", path.display()))?;
    println!(
        "Wrote {} points, {} edges, {} faces to {}",
        scene.count_of(PrimitiveKind::Point),
        scene.count_of(PrimitiveKind::Segment),
        scene.count_of(PrimitiveKind::Triangle),
        path.display()
    );
    Ok(())
}

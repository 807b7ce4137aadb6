use std::error::Error;
use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use realmgen::biomes::Biome;
use realmgen::history::civilizations::faction::FactionKind;
use realmgen::{spawn_generation, GenerationRequest, World, WorldConfig};

#[derive(Parser, Debug)]
#[command(name = "realmgen")]
#[command(about = "Generate a procedural world of realms, cultures and religions")]
struct Args {
    /// Seed string (a random one is picked if not specified)
    #[arg(short, long)]
    seed: Option<String>,

    /// Width of the grid in cells
    #[arg(short = 'W', long, default_value = "128")]
    width: usize,

    /// Height of the grid in cells
    #[arg(short = 'H', long, default_value = "96")]
    height: usize,

    /// JSON file with configuration overrides
    #[arg(long)]
    config: Option<String>,

    /// Write the world snapshot as JSON to this path
    #[arg(long)]
    json: Option<String>,

    /// Print the biome map as ASCII
    #[arg(long)]
    ascii: bool,

    /// Describe the cell at X,Y
    #[arg(long, value_parser = parse_cell)]
    inspect: Option<(usize, usize)>,
}

fn parse_cell(s: &str) -> Result<(usize, usize), String> {
    let (x, y) = s.split_once(',').ok_or("expected X,Y")?;
    let x = x.trim().parse().map_err(|_| format!("invalid x: {}", x))?;
    let y = y.trim().parse().map_err(|_| format!("invalid y: {}", y))?;
    Ok((x, y))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "generation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            WorldConfig::from_json_str(&json)?
        }
        None => WorldConfig::default(),
    };

    // The core never picks a seed itself
    let seed = args.seed.clone().unwrap_or_else(|| format!("{:016x}", rand::random::<u64>()));
    println!("Generating world with seed: {}", seed);
    println!("Map size: {}x{}", args.width, args.height);
    println!("Climate: {}", config.climate.mode.description());

    let request = GenerationRequest::new(seed, args.width, args.height);
    let world = spawn_generation(1, request, config).wait(|status| info!("{}...", status))?;

    print_summary(&world);
    if args.ascii {
        print_ascii(&world);
    }
    if let Some((x, y)) = args.inspect {
        print_cell(&world, x, y);
    }
    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&world)?;
        fs::write(path, json)?;
        println!("Snapshot written to {}", path);
    }
    Ok(())
}

fn print_summary(world: &World) {
    let land = world.biomes.as_slice().iter().filter(|b| !b.is_water()).count();
    println!(
        "Land: {} cells ({:.1}%), {} counties",
        land,
        100.0 * land as f64 / world.biomes.len() as f64,
        world.counties.len()
    );
    println!(
        "{} polities, {} realms, {} culture groups, {} religions, {} dynasties, {} alliances",
        world.polities.len(),
        world.realms().count(),
        world.culture_groups.len(),
        world.religions.len(),
        world.dynasties.len(),
        world.alliances.len()
    );
    for religion in &world.religions {
        let followers = world.counties.iter().filter(|c| c.religion == religion.id).count();
        println!("  {} [{}]: {} counties", religion.name, religion.describe(), followers);
    }
    for empire in &world.ancient_empires {
        println!("  Remembered: {} ({} counties)", empire.name, empire.counties.len());
    }

    let mut realms: Vec<_> = world.realms().collect();
    realms.sort_by(|a, b| b.realm_power.total_cmp(&a.realm_power));
    println!("\nRealms:");
    for realm in realms {
        let factions: Vec<String> = realm
            .factions
            .iter()
            .map(|f| format!("{} x{}", f.kind.label(), f.members.len()))
            .collect();
        println!(
            "  {:<40} power {:>6.1}  vassals {:>2}  ruler {}{}{}",
            realm.full_name(),
            realm.realm_power,
            realm.vassals.len(),
            realm.ruler.name,
            if realm.at_war_with.is_empty() { String::new() } else { format!("  at war with {}", realm.at_war_with.len()) },
            if factions.is_empty() { String::new() } else { format!("  factions: {}", factions.join(", ")) },
        );
    }

    let independence = world
        .polities
        .iter()
        .flat_map(|p| p.factions.iter())
        .filter(|f| f.kind == FactionKind::Independence)
        .count();
    if independence > 0 {
        println!("{} independence factions threaten the map", independence);
    }
}

fn biome_char(biome: Biome) -> char {
    match biome {
        Biome::DeepOcean => '~',
        Biome::Ocean => '~',
        Biome::CoastalWater => '-',
        Biome::River => '=',
        Biome::Beach => '.',
        Biome::Grassland => '"',
        Biome::Forest => 'T',
        Biome::Jungle => '&',
        Biome::Taiga => 't',
        Biome::Tundra => ':',
        Biome::Desert => ',',
        Biome::Mountain => '^',
        Biome::Snow => '*',
        Biome::Wetland => '%',
        Biome::Savanna => ';',
    }
}

fn print_ascii(world: &World) {
    for y in 0..world.height {
        let row: String = (0..world.width).map(|x| biome_char(*world.biomes.get(x, y))).collect();
        println!("{}", row);
    }
}

fn print_cell(world: &World, x: usize, y: usize) {
    if x >= world.width || y >= world.height {
        println!("({}, {}) is outside the map", x, y);
        return;
    }
    let info = world.tile_info(x, y);
    println!("\nCell ({}, {}): {}", info.x, info.y, info.biome.display_name());
    println!("  elevation {:.3}  temperature {:.2}  moisture {}", info.elevation, info.temperature, info.moisture_str());
    if info.river_flow > 0 {
        println!("  river flow {}", info.river_flow);
    }
    let show = |label: &str, value: &Option<String>| {
        if let Some(value) = value {
            println!("  {}: {}", label, value);
        }
    };
    show("county", &info.county);
    show("polity", &info.polity);
    show("realm", &info.realm);
    show("culture", &info.culture);
    show("religion", &info.religion);
}

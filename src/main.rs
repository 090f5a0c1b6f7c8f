use clap::{Parser, Subcommand};
use packtea::config::Config;
use packtea::eterpack::{EterPack, StorageType};
use packtea::proto::{self, ProtoVariant};
use packtea::util::fourcc_to_string;
use std::fs::File;
use std::io::Cursor;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "packtea", version = "1.0.0", about = "CryptedObject/Proto/EterPack container CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a directory of files into a .eix/.epk EterPack archive
    Pack {
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        /// Archive base name (writes `<output>.eix` and `<output>.epk`)
        #[arg(short, long)]
        output: PathBuf,
        /// Storage type: uncompressed, lzo1x, lzo1x-xtea, snappy
        #[arg(short, long, default_value = "snappy")]
        storage: String,
    },
    /// Unpack an EterPack archive into a directory
    Unpack {
        /// Archive base name (reads `<input>.eix` and `<input>.epk`)
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// List an EterPack archive's directory
    List { input: PathBuf },
    /// Show the configured FourCCs, versions, and keys
    Info { input: PathBuf },
    /// Wrap/unwrap a flat record table as ItemProto/MobProto
    #[command(subcommand)]
    Proto(ProtoCommands),
}

#[derive(Subcommand)]
enum ProtoCommands {
    /// Wrap a raw record table file into a Proto-framed file
    Encode {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "item")]
        variant: String,
        #[arg(long, required = true)]
        elements: u32,
        #[arg(long, default_value = "1")]
        version: u32,
        #[arg(long, default_value = "0")]
        stride: u32,
    },
    /// Unwrap a Proto-framed file back to its raw record table
    Decode { input: PathBuf, output: PathBuf },
}

fn parse_storage_type(s: &str) -> Result<StorageType, Box<dyn std::error::Error>> {
    match s {
        "uncompressed" => Ok(StorageType::Uncompressed),
        "lzo1x" => Ok(StorageType::CryptedObjectLzo1x),
        "lzo1x-xtea" => Ok(StorageType::CryptedObjectLzo1xXtea),
        "snappy" => Ok(StorageType::CryptedObjectSnappy),
        other => Err(format!("unknown storage type: {other}").into()),
    }
}

fn parse_proto_variant(s: &str) -> Result<ProtoVariant, Box<dyn std::error::Error>> {
    match s {
        "item" => Ok(ProtoVariant::ItemProto),
        "item-old" => Ok(ProtoVariant::ItemProtoOld),
        "mob" => Ok(ProtoVariant::MobProto),
        other => Err(format!("unknown proto variant: {other}").into()),
    }
}

fn eix_path(base: &std::path::Path) -> PathBuf {
    base.with_extension("eix")
}
fn epk_path(base: &std::path::Path) -> PathBuf {
    base.with_extension("epk")
}

fn open_archive(
    base: &std::path::Path,
    config: Config,
) -> Result<EterPack<File>, Box<dyn std::error::Error>> {
    let index_bytes = std::fs::read(eix_path(base))?;
    let body = File::options().read(true).write(true).open(epk_path(base))?;
    Ok(EterPack::load(&index_bytes, body, config)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        // ── Pack ─────────────────────────────────────────────────────────
        Commands::Pack {
            input,
            output,
            storage,
        } => {
            let storage_type = parse_storage_type(&storage)?;
            let config = Config::default();
            let mut pack = EterPack::create(Cursor::new(Vec::<u8>::new()), config);

            for path in &input {
                let data = std::fs::read(path)?;
                let name = path.file_name().unwrap().to_string_lossy();
                pack.put(&name, &data, storage_type)?;
                println!("  packed  {} ({} B)", path.display(), data.len());
            }

            let index_bytes = pack.save();
            std::fs::write(eix_path(&output), &index_bytes)?;
            std::fs::write(epk_path(&output), pack.into_body().into_inner())?;
            println!(
                "Created: {} / {}",
                eix_path(&output).display(),
                epk_path(&output).display()
            );
        }

        // ── Unpack ───────────────────────────────────────────────────────
        Commands::Unpack { input, output_dir } => {
            let mut pack = open_archive(&input, Config::default())?;
            std::fs::create_dir_all(&output_dir)?;
            let names: Vec<String> = pack.files().map(|e| e.filename.clone()).collect();
            for name in names {
                let data = pack.get(&name)?;
                std::fs::write(output_dir.join(&name), &data)?;
                println!("  unpacked  {name} ({} B)", data.len());
            }
            println!("Unpacked to: {}", output_dir.display());
        }

        // ── List ─────────────────────────────────────────────────────────
        Commands::List { input } => {
            let pack = open_archive(&input, Config::default())?;
            println!("Archive: {}", input.display());
            println!(
                "{:<28} {:>10} {:>10} {:>10}  Type",
                "Name", "RealSize", "Size", "CRC32"
            );
            for entry in pack.files() {
                println!(
                    "{:<28} {:>10} {:>10} {:>10x}  {}",
                    entry.filename, entry.real_size, entry.size, entry.crc32, entry.storage_type
                );
            }
        }

        // ── Info ─────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let config = Config::default();
            let pack = open_archive(&input, config.clone())?;
            println!("── EterPack archive ─────────────────────────────────────");
            println!("  Path            {}", input.display());
            println!("  EPKD FourCC     {}", fourcc_to_string(config.epkd_fourcc));
            println!("  EterPack ver.   {}", config.eterpack_version);
            println!("  LZO1X FourCC    {}", fourcc_to_string(config.lzo1x_fourcc));
            println!("  Snappy FourCC   {}", fourcc_to_string(config.snappy_fourcc));
            println!("  MIPX FourCC     {}", fourcc_to_string(config.item_fourcc));
            println!("  MIPT FourCC     {}", fourcc_to_string(config.item_fourcc_old));
            println!("  MMPT FourCC     {}", fourcc_to_string(config.mob_fourcc));
            println!("  Files           {}", pack.files().count());
        }

        // ── Proto ────────────────────────────────────────────────────────
        Commands::Proto(ProtoCommands::Encode {
            input,
            output,
            variant,
            elements,
            version,
            stride,
        }) => {
            let config = Config::default();
            let data = std::fs::read(&input)?;
            let algo = packtea::Lzo1xCompressor::new(config.lzo1x_fourcc);
            let encoded = proto::encode(
                &data,
                parse_proto_variant(&variant)?,
                elements,
                &config.proto_fourccs(),
                version,
                stride,
                &algo,
                &config.keys,
                packtea::Mode::CompressAndEncrypt,
            )?;
            std::fs::write(&output, &encoded)?;
            println!("Encoded {elements} element(s) -> {}", output.display());
        }

        Commands::Proto(ProtoCommands::Decode { input, output }) => {
            let config = Config::default();
            let bytes = std::fs::read(&input)?;
            let algo = packtea::Lzo1xCompressor::new(config.lzo1x_fourcc);
            let proto = proto::decode(&bytes, &config.proto_fourccs(), &algo, &config.keys)?;
            std::fs::write(&output, &proto.payload)?;
            println!(
                "Decoded {:?} with {} element(s) -> {}",
                proto.variant,
                proto.elements,
                output.display()
            );
        }
    }

    Ok(())
}

use clap::{ArgAction, Parser};
use mp4schema::{
    Element, FourCC, Node, NodeKind, ParseOptions, Registry, SizePolicy,
    api::to_json_tree,
    default_registry, parse_file,
    util::hex_dump,
};
use std::fs;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(version, about = "Schema-driven MP4/ISOBMFF box explorer")]
struct Args {
    /// MP4/ISOBMFF file path
    path: String,

    /// Only print subtree(s) matching a dotted path (e.g. moov.trak[0].mdia.minf.stbl)
    #[arg(long = "filter")]
    filter: Option<String>,

    /// Hex-dump the bytes of every box of this 4CC (e.g. --raw stsd)
    #[arg(long = "raw")]
    raw: Option<String>,

    /// Limit recursion depth of the printed tree
    #[arg(long, default_value_t = 64)]
    max_depth: usize,

    /// Print field values under each box
    #[arg(long, action = ArgAction::SetTrue)]
    decode: bool,

    /// Bytes to show when dumping raw (0 means the entire box)
    #[arg(long, default_value_t = 0)]
    bytes: usize,

    /// Emit JSON instead of human-readable tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Load the box catalogue from this JSON file instead of the built-in one
    #[arg(long)]
    schema: Option<String>,

    /// Treat sizes 0 and 0xFFFFFFFF as "to the end of the parent"
    #[arg(long, action = ArgAction::SetTrue)]
    open_ended_sizes: bool,

    /// Fail on missing mandatory boxes and repeated singletons
    #[arg(long, action = ArgAction::SetTrue)]
    strict_cardinality: bool,

    /// Re-serialize the parsed tree to this path
    #[arg(long)]
    rewrite: Option<String>,

    /// Debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.json {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(if args.verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            })
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    let custom;
    let reg: &Registry = match &args.schema {
        Some(path) => {
            custom = Registry::from_json(&fs::read_to_string(path)?)?;
            info!(path = %path, entries = custom.len(), "loaded schema");
            &custom
        }
        None => default_registry(),
    };

    let options = ParseOptions::default()
        .with_size_policy(if args.open_ended_sizes {
            SizePolicy::OpenEnded
        } else {
            SizePolicy::Strict
        })
        .with_cardinality(args.strict_cardinality);

    let data = fs::read(&args.path)?;
    debug!(path = %args.path, len = data.len(), "parsing");
    let mut root = parse_file(reg, &data, options)?;

    // Target roots for printing/JSON
    let targets: Vec<&Node> = match &args.filter {
        Some(path) => root.select(path),
        None => root.children().iter().collect(),
    };

    if args.json {
        let json_boxes: Vec<_> = targets
            .iter()
            .flat_map(|b| to_json_tree(b, reg, args.decode))
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_boxes)?);
    } else {
        for b in &targets {
            print_box(b, 0, args.max_depth, args.decode, reg);
        }

        if let Some(sel) = args.raw.as_ref() {
            let typ: FourCC = sel.parse().map_err(anyhow::Error::msg)?;
            dump_raw(&mut root, typ, args.bytes)?;
        }
    }

    if let Some(out) = &args.rewrite {
        let bytes = root.serialize()?;
        fs::write(out, &bytes)?;
        info!(path = %out, len = bytes.len(), "rewrote file");
    }

    Ok(())
}

// ---------- Human-readable tree ----------

fn print_box(b: &Node, depth: usize, max_depth: usize, decode: bool, reg: &Registry) {
    let indent = "  ".repeat(depth);
    let name = reg.get(&b.typ()).map(|e| e.name.as_str()).unwrap_or("");
    let size = b.declared_size().map(u64::from).unwrap_or(b.byte_len() as u64);
    let version = match (b.get("version"), b.get("flags")) {
        (Ok(v), Ok(f)) => format!(
            " (ver={}, flags=0x{:06x})",
            v.as_uint().unwrap_or(0),
            f.as_uint().unwrap_or(0)
        ),
        _ => String::new(),
    };

    match b.kind() {
        NodeKind::Leaf => println!("{indent}{:>10} {} {name}{version}", size, b.typ()),
        NodeKind::Opaque => println!("{indent}{:>10} {} (unknown)", size, b.typ()),
        NodeKind::Container(children) => {
            println!("{indent}{:>10} {} {name} (container)", size, b.typ());
            if depth < max_depth {
                for c in children {
                    print_box(c, depth + 1, max_depth, decode, reg);
                }
            }
            return;
        }
    }

    if decode {
        let body = b
            .fields()
            .filter(|(n, _, _)| !matches!(*n, "size" | "type" | "version" | "flags"));
        for (field, _, el) in body {
            match el {
                Element::Raw(bytes) => {
                    println!("{indent}    {field} = <{} bytes>", bytes.len())
                }
                other => println!("{indent}    {field} = {:?}", other.value()),
            }
        }
    }
}

// ---------- Raw dump ----------

fn dump_raw(root: &mut Node, typ: FourCC, limit: usize) -> anyhow::Result<()> {
    let mut matches = Vec::new();
    select_boxes(root.children_mut(), typ, &mut matches)?;
    for (i, bytes) in matches.into_iter().enumerate() {
        let to_show = if limit == 0 || limit > bytes.len() {
            bytes.len()
        } else {
            limit
        };
        println!("\n== Dump {} ({}) len={} ==", i, typ, to_show);
        print!("{}", hex_dump(&bytes[..to_show], 0));
    }
    Ok(())
}

fn select_boxes(list: &mut [Node], typ: FourCC, out: &mut Vec<Vec<u8>>) -> anyhow::Result<()> {
    for b in list {
        if b.typ() == typ {
            out.push(b.serialize()?);
        }
        select_boxes(b.children_mut(), typ, out)?;
    }
    Ok(())
}

//! Minimal line-oriented front end for exercising the ACL subsystem
//! end to end: AUTH, `ACL <subcommand>`, and a handful of commands run
//! through the authorization gate before being acknowledged. There is
//! no real keyspace behind this — it exists to drive the ACL, not to
//! be a usable server.

use redis_sim::security::acl::admin;
use redis_sim::{AclContext, AclServerConfig, Connection, GlobMatcher, Reply};
use std::io::{self, BufRead, Write};
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AclServerConfig::from_env();
    let mut ctx = AclContext::new();

    if let Some(path) = &config.acl_file {
        match redis_sim::security::acl::file::load_acl_file(
            path,
            &mut ctx.registry,
            &mut ctx.ids,
            &ctx.table,
        ) {
            Ok(()) => info!(path = %path.display(), "loaded ACL file"),
            Err(e) => eprintln!("failed to load ACL file {}: {}", path.display(), e),
        }
    }

    let mut conn = Connection::new();
    let matcher = GlobMatcher;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        let reply = dispatch(&mut ctx, &mut conn, &matcher, &line);
        writeln!(stdout, "{}", format_reply(&reply)).ok();
    }
}

fn dispatch(
    ctx: &mut AclContext,
    conn: &mut Connection,
    matcher: &GlobMatcher,
    line: &str,
) -> Reply {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&cmd) = tokens.first() else {
        return Reply::err("ERR empty command");
    };

    match cmd.to_ascii_uppercase().as_str() {
        "AUTH" => {
            let args: Vec<&[u8]> = tokens[1..].iter().map(|s| s.as_bytes()).collect();
            conn.handle_auth(ctx, &args)
        }
        "ACL" => dispatch_acl(ctx, conn, &tokens[1..]),
        _ => {
            let argv: Vec<Vec<u8>> = tokens.iter().map(|s| s.as_bytes().to_vec()).collect();
            match conn.authorize(ctx, &argv, matcher) {
                Ok(()) => match cmd.to_ascii_uppercase().as_str() {
                    "PING" => Reply::Simple("PONG".to_string()),
                    _ => Reply::ok(),
                },
                Err(denial) => denial,
            }
        }
    }
}

fn dispatch_acl(ctx: &mut AclContext, conn: &Connection, args: &[&str]) -> Reply {
    let Some(&sub) = args.first() else {
        return Reply::err("ERR wrong number of arguments for 'acl' command");
    };
    match sub.to_ascii_uppercase().as_str() {
        "HELP" => admin::help(),
        "WHOAMI" => admin::whoami(conn.bound_username()),
        "USERS" => admin::users(&ctx.registry),
        "LIST" => admin::list(&ctx.registry),
        "GETUSER" => match args.get(1) {
            Some(name) => admin::getuser(&ctx.registry, name),
            None => Reply::err("ERR wrong number of arguments"),
        },
        "SETUSER" => match args.get(1) {
            Some(name) => {
                let tokens: Vec<&[u8]> = args[2..].iter().map(|s| s.as_bytes()).collect();
                admin::setuser(ctx, name, &tokens)
            }
            None => Reply::err("ERR wrong number of arguments"),
        },
        "DELUSER" => admin::deluser(&mut ctx.registry, &args[1..]),
        "CAT" => admin::cat(ctx, args.get(1).copied()),
        "GENPASS" => admin::genpass(args.get(1).and_then(|s| s.parse().ok())),
        other => Reply::err(format!("ERR Unknown ACL subcommand '{}'", other)),
    }
}

fn format_reply(reply: &Reply) -> String {
    match reply {
        Reply::Simple(s) => format!("+{}", s),
        Reply::Error(e) => format!("-{}", e),
        Reply::Bulk(Some(b)) => String::from_utf8_lossy(b).to_string(),
        Reply::Bulk(None) | Reply::NullBulk => "(nil)".to_string(),
        Reply::Array(items) => items
            .iter()
            .map(format_reply)
            .collect::<Vec<_>>()
            .join("\n"),
        Reply::Map(pairs) => pairs
            .iter()
            .map(|(k, v)| format!("{}: {}", k, format_reply(v)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

//! Command dispatch: verb lookup in a sorted table via binary search, the
//! direct async translation of the original's sorted `dispatch_table` plus
//! `bsearch`.

use crate::commands;
use crate::session::Session;
use std::future::Future;
use std::pin::Pin;

type HandlerFuture<'a> = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + 'a>>;
type CommandFn = for<'a> fn(&'a mut Session, &'a str) -> HandlerFuture<'a>;

struct Entry {
    name: &'static str,
    handler: CommandFn,
}

macro_rules! entry {
    ($name:literal, $handler:path) => {
        Entry {
            name: $name,
            handler: |s, a| Box::pin($handler(s, a)),
        }
    };
}

/// Sorted (ASCII-uppercase) by verb name, aliases included, so
/// `binary_search_by` can locate a handler in O(log n).
static TABLE: &[Entry] = &[
    entry!("ALLO", commands::allo),
    entry!("APPE", commands::unsupported_502),
    entry!("CDUP", commands::cdup),
    entry!("CWD", commands::cwd),
    entry!("DELE", commands::dele),
    entry!("FEAT", commands::feat),
    entry!("LIST", commands::list),
    entry!("MKD", commands::mkd),
    entry!("MODE", commands::mode),
    entry!("NLST", commands::unsupported_504),
    entry!("NOOP", commands::noop),
    entry!("OPTS", commands::opts),
    entry!("PASS", commands::pass),
    entry!("PASV", commands::pasv),
    entry!("PORT", commands::port),
    entry!("PWD", commands::pwd),
    entry!("QUIT", commands::quit),
    entry!("REST", commands::unsupported_502),
    entry!("RETR", commands::retr),
    entry!("RMD", commands::rmd),
    entry!("RNFR", commands::rnfr),
    entry!("RNTO", commands::rnto),
    entry!("STOR", commands::stor),
    entry!("STOU", commands::unsupported_502),
    entry!("STRU", commands::stru),
    entry!("SYST", commands::syst),
    entry!("TYPE", commands::type_cmd),
    entry!("USER", commands::user),
    entry!("XCUP", commands::cdup),
    entry!("XMKD", commands::mkd),
    entry!("XPWD", commands::pwd),
    entry!("XRMD", commands::rmd),
];

pub async fn dispatch(session: &mut Session, verb: &str, args: &str) -> std::io::Result<()> {
    log::trace!("session {}: dispatch {} {}", session.id, verb, args);
    match TABLE.binary_search_by(|e| e.name.cmp(verb)) {
        Ok(idx) => (TABLE[idx].handler)(session, args).await,
        Err(_) => {
            session
                .reply(502, &format!("invalid command -> {} {}", verb, args))
                .await
        }
    }
}

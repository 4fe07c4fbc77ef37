//! `portfolio posts ...`: the blog content client from the command line.

use std::io::Write;

use clap::Subcommand;
use pf_cms::{
    check_environment, BlogPost, CmsClient, CmsConfig, HttpTransport, ListQuery, PaginationInfo,
};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PostsCommand {
    /// List posts, newest window first
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Show one post
    Get { id: String },
}

/// Validate credentials from the environment and run against the live API.
pub fn run(command: &PostsCommand) -> Result<(), String> {
    check_environment(|name| std::env::var(name).ok()).log();
    let config = CmsConfig::from_env().map_err(|e| e.user_message())?;
    let client = CmsClient::new(config).map_err(|e| e.user_message())?;
    let stdout = std::io::stdout();
    run_with(&client, command, &mut stdout.lock())
}

pub fn run_with<T: HttpTransport>(
    client: &CmsClient<T>,
    command: &PostsCommand,
    out: &mut impl Write,
) -> Result<(), String> {
    let io = |e: std::io::Error| format!("Failed to write output: {e}");
    match command {
        PostsCommand::List { limit, offset } => {
            let query = ListQuery {
                limit: *limit,
                offset: *offset,
                ..ListQuery::default()
            };
            let list = client.list_posts(&query).map_err(|e| e.user_message())?;
            for post in &list.contents {
                writeln!(out, "{}", summary_line(post)).map_err(io)?;
            }
            let page = PaginationInfo::from_list(&list);
            writeln!(
                out,
                "page {} / {} ({} posts)",
                page.current_page, page.total_pages, page.total_count
            )
            .map_err(io)?;
        }
        PostsCommand::Get { id } => {
            let post = client
                .get_post(id, &ListQuery::default())
                .map_err(|e| e.user_message())?;
            writeln!(out, "{}", summary_line(&post)).map_err(io)?;
            if let Some(category) = &post.category {
                writeln!(out, "category: {}", category.name).map_err(io)?;
            }
            if !post.tags.is_empty() {
                let tags: Vec<&str> = post.tags.iter().map(|t| t.name.as_str()).collect();
                writeln!(out, "tags: {}", tags.join(", ")).map_err(io)?;
            }
            writeln!(out).map_err(io)?;
            writeln!(out, "{}", post.content).map_err(io)?;
        }
    }
    Ok(())
}

/// `id  date  title`, dated by publication when known.
pub fn summary_line(post: &BlogPost) -> String {
    let date = post.published_at.as_deref().unwrap_or(&post.created_at);
    let day = date.get(..10).unwrap_or(date);
    format!("{}  {}  {}", post.id, day, post.title)
}

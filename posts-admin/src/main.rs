use std::sync::Arc;

use clap::{Parser, Subcommand};
use posts_server::application::admin_service::{
    AdminService, GroupChanges, PublishedFilter, display_or_empty,
};
use posts_server::data::group_repository::{GroupSearch, PostgresGroupRepository};
use posts_server::data::post_repository::PostgresPostRepository;
use posts_server::data::user_repository::PostgresUserRepository;
use posts_server::domain::group::Group;
use posts_server::domain::post::PostEntry;
use posts_server::infrastructure::database::{create_pool, run_migrations};
use posts_server::infrastructure::logging::init_cli_logging;

/// Administrative console for groups, posts and users.
#[derive(Parser, Debug)]
#[command(name = "posts-admin")]
struct Cli {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 2)]
    max_connections: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations.
    Migrate,
    #[command(subcommand)]
    Group(GroupCommand),
    #[command(subcommand)]
    Post(PostCommand),
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    List {
        /// Matches title, slug or description.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        slug: Option<String>,
    },
    Create {
        #[arg(long)]
        title: String,
        /// Derived from the title when omitted.
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    Edit {
        slug: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "new-slug")]
        new_slug: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        slug: String,
    },
}

#[derive(Subcommand, Debug)]
enum PostCommand {
    List {
        /// Matches post text or author username.
        #[arg(long)]
        search: Option<String>,
        /// any, today, week, month or year.
        #[arg(long, default_value_t = PublishedFilter::Any)]
        published: PublishedFilter,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Deletes the user and all of their posts.
    Delete {
        username: String,
    },
}

fn group_header() -> String {
    format!("{:>5}  {:<30}  {:<30}  {}", "pk", "title", "slug", "description")
}

fn group_row(group: &Group) -> String {
    format!(
        "{:>5}  {:<30}  {:<30}  {}",
        group.id,
        group.title,
        group.slug,
        display_or_empty(Some(group.description.as_str()))
    )
}

fn post_header() -> String {
    format!(
        "{:>5}  {:<50}  {:<25}  {:<20}  {}",
        "pk", "text", "pub_date", "author", "group"
    )
}

fn post_row(entry: &PostEntry) -> String {
    format!(
        "{:>5}  {:<50}  {:<25}  {:<20}  {}",
        entry.post.id,
        entry.short_text().replace('\n', " "),
        entry.post.pub_date.format("%Y-%m-%d %H:%M:%S"),
        entry.author,
        display_or_empty(entry.group.as_ref().map(|g| g.title.as_str()))
    )
}

async fn run_group(admin: &AdminService, command: GroupCommand) -> anyhow::Result<()> {
    match command {
        GroupCommand::List {
            search,
            title,
            slug,
        } => {
            let groups = admin
                .list_groups(&GroupSearch {
                    term: search,
                    title,
                    slug,
                })
                .await?;
            println!("{}", group_header());
            for group in &groups {
                println!("{}", group_row(group));
            }
            println!("{} group(s)", groups.len());
        }
        GroupCommand::Create {
            title,
            slug,
            description,
        } => {
            let group = admin.create_group(title, slug, description).await?;
            println!("Group created: {} ({})", group, group.slug);
        }
        GroupCommand::Edit {
            slug,
            title,
            new_slug,
            description,
        } => {
            let group = admin
                .edit_group(
                    &slug,
                    GroupChanges {
                        title,
                        slug: new_slug,
                        description,
                    },
                )
                .await?;
            println!("Group updated: {} ({})", group, group.slug);
        }
        GroupCommand::Delete { slug } => {
            let (group, orphaned) = admin.delete_group(&slug).await?;
            println!(
                "Group deleted: {} ({} post(s) left without a group)",
                group, orphaned
            );
        }
    }
    Ok(())
}

async fn run_post(admin: &AdminService, command: PostCommand) -> anyhow::Result<()> {
    match command {
        PostCommand::List { search, published } => {
            let posts = admin
                .list_posts(search, published, chrono::Utc::now())
                .await?;
            println!("{}", post_header());
            for entry in &posts {
                println!("{}", post_row(entry));
            }
            println!("{} post(s)", posts.len());
        }
        PostCommand::Delete { id } => {
            admin.delete_post(id).await?;
            println!("Post {} deleted", id);
        }
    }
    Ok(())
}

async fn run_user(admin: &AdminService, command: UserCommand) -> anyhow::Result<()> {
    match command {
        UserCommand::Create {
            username,
            password,
            email,
        } => {
            let user = admin.create_user(username, email, password).await?;
            println!("User created: {} ({})", user.username, user.id);
        }
        UserCommand::Delete { username } => {
            let removed = admin.delete_user(&username).await?;
            println!("User {} deleted along with {} post(s)", username, removed);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_cli_logging();
    let args = Cli::parse();

    let pool = create_pool(&args.database_url, args.max_connections).await?;

    if let Command::Migrate = args.command {
        run_migrations(&pool).await?;
        println!("Migrations applied");
        return Ok(());
    }

    let admin = AdminService::new(
        Arc::new(PostgresPostRepository::new(pool.clone())),
        Arc::new(PostgresGroupRepository::new(pool.clone())),
        Arc::new(PostgresUserRepository::new(pool)),
    );

    match args.command {
        Command::Migrate => {}
        Command::Group(command) => run_group(&admin, command).await?,
        Command::Post(command) => run_post(&admin, command).await?,
        Command::User(command) => run_user(&admin, command).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use posts_server::domain::post::{GroupSummary, Post};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_group_create_without_slug() {
        let cli = Cli::try_parse_from([
            "posts-admin",
            "--database-url",
            "postgres://localhost/posts",
            "group",
            "create",
            "--title",
            "Cats",
        ])
        .unwrap();
        match cli.command {
            Command::Group(GroupCommand::Create {
                title,
                slug,
                description,
            }) => {
                assert_eq!(title, "Cats");
                assert!(slug.is_none());
                assert!(description.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_post_list_date_filter() {
        let cli = Cli::try_parse_from([
            "posts-admin",
            "--database-url",
            "postgres://x",
            "post",
            "list",
            "--published",
            "week",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Post(PostCommand::List {
                published: PublishedFilter::PastWeek,
                ..
            })
        ));

        let bad = Cli::try_parse_from([
            "posts-admin",
            "--database-url",
            "postgres://x",
            "post",
            "list",
            "--published",
            "decade",
        ]);
        assert!(bad.is_err());
    }

    #[test]
    fn rows_mark_empty_values() {
        let group = Group {
            id: 3,
            title: "Cats".into(),
            slug: "cats".into(),
            description: String::new(),
        };
        assert!(group_row(&group).ends_with("-empty-"));

        let entry = PostEntry {
            post: Post::new(Default::default(), "line one\nline two".into(), None),
            author: "alice".into(),
            group: None,
        };
        let row = post_row(&entry);
        assert!(row.contains("line one line two"));
        assert!(row.ends_with("-empty-"));

        let grouped = PostEntry {
            group: Some(GroupSummary {
                slug: "cats".into(),
                title: "Cats".into(),
            }),
            ..entry
        };
        assert!(post_row(&grouped).ends_with("Cats"));
    }
}

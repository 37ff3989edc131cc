use crate::app::{FreshetError, Result};
use crate::domain::FeedStatus;
use crate::sync::{Snapshot, SyncHandle};

pub async fn add_source(sync: &SyncHandle, name: &str, url: &str) -> Result<()> {
    if sync.snapshot().source_by_url(url).is_some() {
        println!("Source already exists: {}", url);
        return Ok(());
    }

    sync.add_source(name, url).await?;

    // settle once the validation fetch has finished, or the source is gone
    let owned_url = url.to_string();
    sync.wait_until(move |s| match s.source_by_url(&owned_url) {
        Some(source) => s.source_status(source.id) != FeedStatus::Loading,
        None => s.revision > 0,
    })
    .await?;

    let snap = sync.snapshot();
    let Some(source) = snap.source_by_url(url) else {
        return Err(FreshetError::EmptyFeed(url.to_string()));
    };
    match snap.source_status(source.id) {
        FeedStatus::Error => {
            println!("Added {} (fetch failed, will retry on next refresh)", url);
        }
        _ => println!("Added {}: {} items", url, snap.items.len()),
    }
    Ok(())
}

pub async fn remove_source(sync: &SyncHandle, url: &str) -> Result<()> {
    let id = sync
        .snapshot()
        .source_by_url(url)
        .map(|s| s.id)
        .ok_or_else(|| FreshetError::SourceNotFound(url.to_string()))?;

    sync.delete_source(id).await?;
    sync.wait_until(move |s| s.sources.iter().all(|src| src.id != id))
        .await?;
    println!("Removed source: {}", url);
    Ok(())
}

pub async fn edit_source(
    sync: &SyncHandle,
    url: &str,
    name: Option<&str>,
    new_url: Option<&str>,
) -> Result<()> {
    let source = sync
        .snapshot()
        .source_by_url(url)
        .cloned()
        .ok_or_else(|| FreshetError::SourceNotFound(url.to_string()))?;

    let name = name.unwrap_or(&source.name).to_string();
    let target = new_url.unwrap_or(&source.url).to_string();
    sync.update_source(source.id, &name, &target).await?;

    let id = source.id;
    let expected = target.clone();
    sync.wait_until(move |s| {
        s.sources
            .iter()
            .any(|src| src.id == id && src.url == expected && src.name == name)
    })
    .await?;
    println!("Updated source: {}", target);
    Ok(())
}

pub fn list_sources(sync: &SyncHandle) -> Result<()> {
    let snap = sync.snapshot();
    if snap.sources.is_empty() {
        println!("No sources");
        return Ok(());
    }

    for source in &snap.sources {
        let marker = if snap.unread_sources.contains(&source.id) {
            "*"
        } else {
            " "
        };
        println!("{} {}  {}", marker, source.name, source.url);
    }
    Ok(())
}

pub async fn show_items(sync: &SyncHandle, url: &str) -> Result<()> {
    let id = sync
        .snapshot()
        .source_by_url(url)
        .map(|s| s.id)
        .ok_or_else(|| FreshetError::SourceNotFound(url.to_string()))?;

    sync.select_source(Some(id)).await?;
    sync.wait_until(move |s| {
        s.selected == Some(id) && s.source_status(id) != FeedStatus::Loading
    })
    .await?;

    let snap = sync.snapshot();
    if snap.source_status(id) == FeedStatus::ErrorStaleCache {
        println!("(fetch failed, showing cached items)");
    }
    if snap.items.is_empty() {
        println!("No items");
        return Ok(());
    }
    print_items(&snap);
    Ok(())
}

pub async fn refresh(sync: &SyncHandle) -> Result<()> {
    let snap = sync.snapshot();
    if snap.sources.is_empty() {
        println!("No sources to refresh");
        return Ok(());
    }
    println!("Refreshing {} sources...", snap.sources.len());

    let rev = snap.revision;
    sync.refresh_all(false).await?;
    sync.wait_until(move |s| s.revision > rev && !s.refreshing)
        .await?;

    let snap = sync.snapshot();
    let errors = snap
        .sources
        .iter()
        .filter(|s| {
            matches!(
                snap.source_status(s.id),
                FeedStatus::Error | FeedStatus::ErrorStaleCache
            )
        })
        .count();
    println!(
        "Refresh complete: {} sources, {} with unread items, {} errors",
        snap.sources.len(),
        snap.unread_sources.len(),
        errors
    );
    Ok(())
}

pub async fn mark_read(sync: &SyncHandle, link: &str) -> Result<()> {
    sync.mark_read(link).await?;
    let owned = link.to_string();
    sync.wait_until(move |s| s.read_links.contains(&owned)).await?;
    println!("Marked read: {}", link);
    Ok(())
}

pub async fn mark_unread(sync: &SyncHandle, link: &str) -> Result<()> {
    let rev = sync.snapshot().revision;
    sync.mark_unread(link).await?;
    sync.wait_until(move |s| s.revision > rev).await?;
    println!("Marked unread: {}", link);
    Ok(())
}

pub async fn mark_all_read(sync: &SyncHandle) -> Result<()> {
    let rev = sync.snapshot().revision;
    sync.mark_all_read().await?;
    sync.wait_until(move |s| s.revision > rev).await?;
    println!("Marked all items read");
    Ok(())
}

pub async fn watch(sync: &SyncHandle) -> Result<()> {
    let mut rx = sync.subscribe();
    let snap = sync.snapshot();
    println!(
        "Watching {} sources, refresh every 15 minutes (Ctrl-C to stop)",
        snap.sources.len()
    );

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = rx.borrow_and_update().clone();
                println!(
                    "[rev {}] {} sources, {} with unread items{}",
                    snap.revision,
                    snap.sources.len(),
                    snap.unread_sources.len(),
                    if snap.refreshing { ", refreshing" } else { "" }
                );
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn print_items(snap: &Snapshot) {
    for item in &snap.items {
        let marker = if snap.read_links.contains(&item.link) {
            " "
        } else {
            "*"
        };
        match item.pub_date {
            Some(date) => println!(
                "{} {}  ({})\n    {}",
                marker,
                item.display_title(),
                date.format("%Y-%m-%d"),
                item.link
            ),
            None => println!("{} {}\n    {}", marker, item.display_title(), item.link),
        }
    }
}

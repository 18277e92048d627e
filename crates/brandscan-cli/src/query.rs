//! Read-only prospect and result queries.

/// List prospects with status and last error.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn list_prospects(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let prospects = brandscan_db::list_prospects(pool).await?;

    if prospects.is_empty() {
        println!("no prospects found; run `brandscan db seed` first");
        return Ok(());
    }

    println!("{:<6}{:<28}{:<22}{:<13}LAST ERROR", "ID", "BRAND", "CATEGORY", "STATUS");
    for p in &prospects {
        println!(
            "{:<6}{:<28}{:<22}{:<13}{}",
            p.id,
            p.brand_name,
            p.industry_category.as_deref().unwrap_or("-"),
            p.status,
            p.last_error.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

/// Print recent analysis results, newest first.
///
/// # Errors
///
/// Returns an error if the brand filter does not match a prospect or the
/// database query fails.
pub(crate) async fn show_results(
    pool: &sqlx::PgPool,
    brand_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<()> {
    let prospect_id = if let Some(name) = brand_filter {
        let prospect = brandscan_db::get_prospect_by_name(pool, name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("prospect '{name}' not found"))?;
        Some(prospect.id)
    } else {
        None
    };

    let results = brandscan_db::list_analysis_results(pool, prospect_id, limit.max(1)).await?;

    if results.is_empty() {
        println!(
            "no analysis results found{}; run `brandscan run` first",
            brand_filter
                .map(|s| format!(" for '{s}'"))
                .unwrap_or_default()
        );
        return Ok(());
    }

    for r in &results {
        println!(
            "## {} ({}, {} items in {} batches)",
            r.brand_name,
            r.generated_at.format("%Y-%m-%d %H:%M"),
            r.item_count,
            r.batch_count
        );
        println!("{}", r.key_insight);
        if let Some(s) = r.sentiment() {
            println!(
                "sentiment: {}% positive, {}% negative, {}% neutral",
                s.positive, s.negative, s.neutral
            );
        }
        if !r.themes.is_empty() {
            println!("themes:");
            for theme in &r.themes {
                println!("  - {theme}");
            }
        }
        if !r.customer_segments.is_empty() {
            println!("segments:");
            for segment in &r.customer_segments {
                println!("  - {segment}");
            }
        }
        if !r.recommendations.is_empty() {
            println!("recommendations:");
            for rec in &r.recommendations {
                println!("  - {rec}");
            }
        }
        println!();
    }

    Ok(())
}

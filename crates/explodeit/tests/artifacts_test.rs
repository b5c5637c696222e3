use explodeit::{
    ArtifactWriter, ComponentPart, GenerationItem, InlineData, ItemId, ItemPatch, MIME_PNG,
    MIME_WAV, ObjectPlan, TokenUsage, pcm_to_wav, render_article,
};

fn plan() -> anyhow::Result<ObjectPlan> {
    Ok(serde_json::from_value(serde_json::json!({
        "displayTitle": "Bicycle",
        "category": "Transport",
        "domainType": "PHYSICAL",
        "visualMetaphor": "Exploded View",
        "sectionTitles": {
            "origin": "Draisine Days",
            "anatomy": "Frame and Drivetrain",
            "article": "Pedal Power",
            "trivia": "Spoke Facts"
        },
        "originStory": "Started as a running machine.",
        "detailedArticle": "Chains turn sprockets.",
        "trivia": ["one", "two"],
        "visualStylePrompt": "Studio",
        "componentList": ["Chain", "Derailleur"],
        "audioVibe": { "voiceName": "Puck", "toneDescription": "Breezy" }
    }))?)
}

fn enriched(name: &str, sources: &[&str]) -> ComponentPart {
    ComponentPart {
        name: name.to_string(),
        short_description: format!("The {name}."),
        detailed_content: Some(format!("{name} in depth.")),
        composition: "Steel".to_string(),
        sources: Some(sources.iter().map(|s| s.to_string()).collect()),
    }
}

#[test]
fn test_partial_item_writes_what_it_has() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut item = GenerationItem::new(ItemId::from("42"), "Bicycle", 42, false, vec![]);
    item.apply(
        ItemPatch::new()
            .infographic_url(InlineData::new(MIME_PNG, vec![1, 2, 3]).to_data_url())
            .usage(TokenUsage::new("image-model", 20, 0, 0.134)),
    );

    let written = ArtifactWriter::new(dir.path()).write(&item)?;
    let names: Vec<_> = written
        .iter()
        .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
        .collect();
    assert_eq!(names, vec!["infographic.png", "usage.json"]);
    assert_eq!(std::fs::read(dir.path().join("42/infographic.png"))?, vec![1, 2, 3]);

    let ledger: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("42/usage.json"))?)?;
    assert_eq!(ledger["totals"]["calls"], 1);
    Ok(())
}

#[test]
fn test_complete_item_writes_article_and_audio() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut item = GenerationItem::new(ItemId::from("7"), "Bicycle", 7, false, vec![]);
    item.apply(
        ItemPatch::new()
            .plan(plan()?)
            .components(vec![
                enriched("Chain", &["https://a.example", "https://b.example"]),
                enriched("Derailleur", &["https://a.example"]),
            ])
            .narration_script("Two wheels, one idea.")
            .audio_url(InlineData::new(MIME_WAV, pcm_to_wav(&[0; 4], 24_000)?).to_data_url()),
    );

    let writer = ArtifactWriter::new(dir.path());
    writer.write(&item)?;
    let item_dir = writer.item_dir(&item);
    for file in ["narration.wav", "narration.txt", "plan.json", "article.md"] {
        assert!(item_dir.join(file).exists(), "missing {file}");
    }
    assert_eq!(std::fs::read(item_dir.join("narration.wav"))?.len(), 44 + 4);

    let article = render_article(&item);
    assert!(article.starts_with("# Bicycle"));
    assert!(article.contains("## Frame and Drivetrain"));
    assert!(article.contains("### Derailleur"));
    assert!(article.contains("**Composition:** Steel"));
    assert_eq!(article.matches("<https://a.example>").count(), 1);
    Ok(())
}

#[test]
fn test_article_is_empty_without_plan() {
    let item = GenerationItem::new(ItemId::from("1"), "Kettle", 1, true, vec![]);
    assert!(render_article(&item).is_empty());
}

//! Prompt text for each stage.

use explodeit_core::{DomainType, ObjectPlan};

pub(crate) fn surprise(seed: u32) -> String {
    format!(
        "Name ONE fascinating physical object that would make a good subject for an \
         educational exploded-view diagram. It needs enough internal parts to be worth \
         taking apart. Good examples: \"Mechanical Wristwatch\", \"Vintage SLR Camera\", \
         \"Human Heart\", \"Jet Engine Turbine\", \"Espresso Machine Grouphead\".\n\n\
         Reply with the name only.\nVariation seed: {seed}"
    )
}

pub(crate) fn plan(topic: &str) -> String {
    format!(
        r#"You are planning an entry for an encyclopedia that teaches how things work by taking them apart. Plan the entry for: "{topic}".

Use current information; the topic may be a recent technology, a piece of software or a niche idea. If the topic is a URL, treat it as context.

1. Domain
- Set domainType to one of PHYSICAL, SOFTWARE, CONCEPTUAL, BIOLOGICAL or OTHER.
- Pick a visualMetaphor for the diagram: an "Exploded View" for physical objects, a "System Architecture Diagram" or "Data Flow Visualization" for software, a "Mind Map" for ideas, an "Anatomical Dissection" for living things.

2. Section titles
- origin: history, inception or root cause
- anatomy: structure, components, modules or stages
- article: how it works, the mechanics, the code or the philosophy
- trivia: something like "Did You Know?", "Edge Cases" or "Fun Facts"

3. Content
- componentList: the 6 to 8 most important parts (gears and lenses, or APIs and databases, or focus and breath).
- originStory: an overview of roughly 100 words.
- detailedArticle: roughly 800 words of markdown with headers, going deep on how it works.
- trivia: 5 surprising facts.

4. Style
- visualStylePrompt: photorealistic for physical and biological subjects, polished 3D tech renders for software, ethereal and surreal for concepts.
- audioVibe: a narrator voice that suits the topic, for example Fenrir for intense technology or Zephyr for calm subjects.

Return only JSON that matches the schema."#
    )
}

fn domain_label(domain: DomainType) -> &'static str {
    domain.into()
}

pub(crate) fn infographic(topic: &str, plan: &ObjectPlan) -> String {
    format!(
        r#"Render a detailed educational infographic: a "{metaphor}" of {topic}.

This is a {domain} subject. Show these components: {parts}.
Visual style: {style}.

- Physical or biological subjects: parts floating apart in an exploded view, leader lines, studio lighting.
- Software subjects: isometric 3D architecture, glowing data streams, server blocks and floating modules joined by logical flows, dark tech aesthetic.
- Conceptual subjects: abstract 3D forms such as spheres or planes standing for ideas, linked nodes, soft ethereal light.

Keep the composition clean, centered and high resolution."#,
        metaphor = plan.visual_metaphor,
        domain = domain_label(plan.domain_type),
        parts = plan.component_list.join(", "),
        style = plan.visual_style_prompt,
    )
}

pub(crate) fn assembled(topic: &str, plan: &ObjectPlan) -> String {
    format!(
        r#"Show {title} ({topic}) finished and whole, as a photorealistic studio shot or a high-end 3D render.

Context: {description}
Domain: {domain}

- Physical: the object is closed and intact, resting on a surface.
- Software: the running application as a futuristic dashboard on a glass tablet or a floating hologram.
- Conceptual: one unified scene or symbol showing the idea fully realized.

The attached diagram is the reference for materials and look. Show the assembled state, not the exploded one."#,
        title = plan.display_title,
        description = plan.origin_story,
        domain = domain_label(plan.domain_type),
    )
}

pub(crate) fn deep_dive(topic: &str, components: &[String]) -> String {
    format!(
        r#"Research each of the following components of {topic} and write an educational analysis of it. Search the web for accurate technical, scientific or historical detail.

Components: {names}

Answer with ONE JSON object of the form {{ "components": [ ... ] }} where every entry has:
- "name": the component name
- "composition": what it is made of; a material for physical parts, a language or framework for software, a core principle for ideas
- "shortDescription": a one-sentence summary
- "detailedContent": three or four paragraphs, about 200 words, on what it does and why it matters

Output the JSON only."#,
        names = components.join(", "),
    )
}

pub(crate) fn video(topic: &str, plan: &ObjectPlan) -> String {
    format!(
        r#"A cinematic technical animation of {topic}.

Kind: {domain} ({metaphor}).

- Physical: a slow-motion assembly of the exploded view, parts gliding in and locking together.
- Software: packets flowing through the architecture, modules lighting up, code compiling into an interface.
- Conceptual: abstract shapes morphing and merging into one sphere of light.

Smooth motion, high-end render, educational focus, no on-screen text."#,
        domain = domain_label(plan.domain_type),
        metaphor = plan.visual_metaphor,
    )
}

/// Narration prompt. The article is cut to `article_chars` characters.
pub(crate) fn narration(topic: &str, plan: &ObjectPlan, article_chars: usize) -> String {
    let article: String = plan.detailed_article.chars().take(article_chars).collect();
    format!(
        r#"You narrate short documentary segments, taking on whatever persona fits the subject: an enthusiastic technologist, a historian or a calm teacher. Write a 45 to 60 second spoken script about {topic}.

Material to draw on:
- Overview: "{origin}"
- Article: "{article}..."
- Trivia: {trivia}

Open with why the subject matters, explain briefly how its parts work together, and close on its impact. Match the tone to the subject.
Write only the words to be spoken, with no stage directions."#,
        origin = plan.origin_story,
        trivia = plan.trivia.join(", "),
    )
}

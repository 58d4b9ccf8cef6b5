use shadow_rs::ShadowBuilder;

// Embeds git and build metadata used by `--version`.
fn main() {
    ShadowBuilder::builder()
        .build()
        .expect("Failed to generate build metadata");
}

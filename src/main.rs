fn main() -> anyhow::Result<()> {
    gpt_shield_lib::run()
}

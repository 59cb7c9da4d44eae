use duct::cmd;

pub fn build_all_crates(release: bool, target: Option<&str>) -> anyhow::Result<()> {
    let mut build_args = vec!["build", "--workspace", "--exclude", "bootswitch-fuzz"];

    if release {
        build_args.extend(["--profile", "release-lto"]);
    }

    if let Some(target) = target {
        build_args.extend(["--target", target]);
    }

    cmd("cargo", build_args).run()?;
    Ok(())
}

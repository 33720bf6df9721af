//! Sample content seeding.
//!
//! A fresh sandbox is useless for a training exercise, so each backend gets
//! a small fixed tree with readable files and a couple of flags to hunt
//! down. Seeding goes through the [`Sandbox`] trait, so the same routine
//! works against either backend.

use redshell_types::error::Result;

use crate::Sandbox;

/// Populate the layout used by the disk backend: a miniature Linux-looking
/// tree under the sandbox root.
pub fn seed_disk_layout(fs: &mut dyn Sandbox) -> Result<()> {
    for dir in ["/home/user", "/etc", "/var/log", "/tmp", "/challenge"] {
        fs.mkdir(dir)?;
    }

    let files: &[(&str, &str)] = &[
        ("/etc/motd.txt", "Welcome to the CTF terminal simulator!\n"),
        ("/home/user/profile.txt", "User profile information\n"),
        ("/home/user/test.txt", "Line 1\nLine 2\nLine 3\n"),
        (
            "/challenge/flag.txt",
            "CTF_FLAG{welcome_to_the_simulation}\n",
        ),
        ("/challenge/data.txt", "apple\nbanana\ncherry\napple\ndate\n"),
    ];
    for (path, content) in files {
        fs.write(path, content.as_bytes(), false)?;
    }
    log::info!("seeded disk sandbox layout");
    Ok(())
}

/// Populate the layout used by the in-memory backend: exactly three
/// directories at the home level, with sample files and a hidden flag
/// beneath them.
pub fn seed_memory_layout(fs: &mut dyn Sandbox) -> Result<()> {
    for dir in ["/desktop", "/documents", "/downloads"] {
        fs.mkdir(dir)?;
    }

    let files: &[(&str, &str)] = &[
        (
            "/desktop/readme.txt",
            "Welcome to the CTF terminal simulator!\nType 'help' for available commands.\n",
        ),
        (
            "/documents/notes.txt",
            "Remember to check hidden files.\nls has an -a option.\n",
        ),
        ("/documents/todo.txt", "learn grep\nlearn pipes\nfind the flag\n"),
        ("/documents/.flag.txt", "CTF_FLAG{hidden_in_plain_sight}\n"),
        ("/downloads/data.txt", "apple\nbanana\ncherry\napple\ndate\n"),
    ];
    for (path, content) in files {
        fs.write(path, content.as_bytes(), false)?;
    }
    log::info!("seeded memory sandbox layout");
    Ok(())
}

// The interactive command loop. This layer only parses words and
// prints lines; everything real happens inside the volume.

use std::io::{BufRead, Write};
use std::path::Path;

use log::debug;

use crate::error_types::filesystem::FsError;
use crate::users::user_struct::UserStore;
use crate::volume::volume_struct::Volume;

/// What one dispatched line tells the loop to do next.
enum Outcome {
    Continue,
    Quit,
}

pub struct Shell {
    volume: Option<Volume>,
    users: UserStore,
}

impl Shell {
    pub fn new() -> Shell {
        Shell {
            volume: None,
            users: UserStore::with_default_accounts(),
        }
    }

    /// Read-eval-print until quit or EOF. Returns the process exit
    /// code; no command error is fatal.
    pub fn run(&mut self) -> i32 {
        println!("EXT2 File System Simulator");
        println!("Type 'help' for available commands");

        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            print!("ext2fs> ");
            if std::io::stdout().flush().is_err() {
                return 1;
            }

            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => break, // EOF
                Ok(_) => {}
                Err(error) => {
                    eprintln!("Error: could not read input: {error}");
                    return 1;
                }
            }

            if let Outcome::Quit = self.dispatch(&line) {
                break;
            }
        }
        0
    }

    fn dispatch(&mut self, line: &str) -> Outcome {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = tokens.first() else {
            return Outcome::Continue;
        };
        debug!("Command: {command}");

        let result: Result<(), FsError> = match command {
            "format" => self.cmd_format(&tokens),
            "mount" => self.cmd_mount(&tokens),
            "umount" => self.cmd_umount(),
            "status" => self.cmd_status(),
            "login" => self.cmd_login(&tokens),
            "logout" => self.cmd_logout(),
            "users" => self.cmd_users(),
            "mkdir" => self.cmd_mkdir(&tokens),
            "rmdir" => self.cmd_rmdir(&tokens),
            "dir" => self.cmd_dir(&tokens),
            "cd" => self.cmd_cd(&tokens),
            "create" => self.cmd_create(&tokens),
            "delete" => self.cmd_delete(&tokens),
            "open" => self.cmd_open(&tokens),
            "close" => self.cmd_close(&tokens),
            "read" => self.cmd_read(&tokens),
            "write" => self.cmd_write(line),
            "chmod" => self.cmd_chmod(&tokens),
            "chown" => self.cmd_chown(&tokens),
            "help" => {
                print_help();
                Ok(())
            }
            "quit" | "exit" => return Outcome::Quit,
            unknown => {
                println!("Unknown command: {unknown}");
                println!("Type 'help' for available commands");
                return Outcome::Continue;
            }
        };

        if let Err(error) = result {
            println!("Error: {error}");
        }
        Outcome::Continue
    }

    /// The mounted volume, or the error every image-touching command
    /// shares.
    fn mounted(&mut self) -> Result<&mut Volume, FsError> {
        self.volume.as_mut().ok_or(FsError::NotMounted)
    }

    fn cmd_format(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let image = *tokens.get(1).ok_or(FsError::InvalidArgument)?;
        Volume::format(Path::new(image))?;
        println!("Disk image formatted: {image}");
        Ok(())
    }

    fn cmd_mount(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let image = *tokens.get(1).ok_or(FsError::InvalidArgument)?;
        if self.volume.is_some() {
            return Err(FsError::AlreadyMounted);
        }
        self.volume = Some(Volume::mount(Path::new(image))?);
        println!("Disk image mounted: {image}");
        Ok(())
    }

    fn cmd_umount(&mut self) -> Result<(), FsError> {
        let volume = self.volume.take().ok_or(FsError::NotMounted)?;
        volume.unmount()?;
        println!("Disk image unmounted");
        Ok(())
    }

    fn cmd_status(&mut self) -> Result<(), FsError> {
        let status = self.mounted()?.status();
        println!("File System Status:");
        println!("Disk image: {}", status.image_path.display());
        println!("Total blocks: {}", status.total_blocks);
        println!("Free blocks: {}", status.free_blocks);
        println!("Total inodes: {}", status.total_inodes);
        println!("Free inodes: {}", status.free_inodes);
        println!(
            "Current user: {}",
            status.current_user.as_deref().unwrap_or("(none)")
        );
        println!("Open files: {}", status.open_files);
        Ok(())
    }

    fn cmd_login(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let (username, password) = match tokens {
            [_, username, password] => (*username, *password),
            _ => return Err(FsError::InvalidArgument),
        };
        let volume = self.volume.as_mut().ok_or(FsError::NotMounted)?;
        volume.login(&self.users, username, password)?;
        println!("Logged in as: {username}");
        Ok(())
    }

    fn cmd_logout(&mut self) -> Result<(), FsError> {
        self.mounted()?.logout();
        println!("Logged out");
        Ok(())
    }

    fn cmd_users(&mut self) -> Result<(), FsError> {
        let _ = self.mounted()?.current_user()?;
        println!("Users:");
        for account in self.users.accounts() {
            println!(
                "  {}  (uid {}, gid {})",
                account.username, account.uid, account.gid
            );
        }
        Ok(())
    }

    fn cmd_mkdir(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let path = *tokens.get(1).ok_or(FsError::InvalidArgument)?;
        self.mounted()?.make_directory(path)?;
        println!("Directory created: {path}");
        Ok(())
    }

    fn cmd_rmdir(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let path = *tokens.get(1).ok_or(FsError::InvalidArgument)?;
        self.mounted()?.remove_directory(path)?;
        println!("Directory removed: {path}");
        Ok(())
    }

    fn cmd_dir(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let path = tokens.get(1).copied().unwrap_or("/");
        let listing = self.mounted()?.list_directory(path)?;
        for entry in listing {
            let kind = if entry.file_type == 2 { 'd' } else { '-' };
            println!(
                "{kind}{:03o}  {:>3}:{:<3}  {:>8}  {:>10}  {}",
                entry.mode & 0o777,
                entry.uid,
                entry.gid,
                entry.size,
                entry.mtime,
                entry.name
            );
        }
        Ok(())
    }

    fn cmd_cd(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let path = tokens.get(1).copied().unwrap_or("/");
        self.mounted()?.change_directory(path)?;
        println!("Changed directory to: {path}");
        Ok(())
    }

    fn cmd_create(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let path = *tokens.get(1).ok_or(FsError::InvalidArgument)?;
        self.mounted()?.create_file(path)?;
        println!("File created: {path}");
        Ok(())
    }

    fn cmd_delete(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let path = *tokens.get(1).ok_or(FsError::InvalidArgument)?;
        self.mounted()?.delete_file(path)?;
        println!("File deleted: {path}");
        Ok(())
    }

    fn cmd_open(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let (path, flags) = match tokens {
            [_, path, flags] => (*path, *flags),
            _ => return Err(FsError::InvalidArgument),
        };
        let flags: u32 = flags.parse().map_err(|_| FsError::InvalidArgument)?;
        let fd = self.mounted()?.open_file(path, flags)?;
        println!("File opened: {path} (fd={fd})");
        Ok(())
    }

    fn cmd_close(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let fd = parse_fd(tokens.get(1))?;
        self.mounted()?.close_file(fd)?;
        println!("File closed: fd={fd}");
        Ok(())
    }

    fn cmd_read(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let fd = parse_fd(tokens.get(1))?;
        let size: usize = tokens
            .get(2)
            .and_then(|token| token.parse().ok())
            .ok_or(FsError::InvalidArgument)?;
        let data = self.mounted()?.read_file(fd, size)?;
        println!("Read {} bytes: {}", data.len(), String::from_utf8_lossy(&data));
        Ok(())
    }

    /// `write <fd> <data...>` keeps everything after the descriptor
    /// verbatim, spaces included, so it gets the raw line.
    fn cmd_write(&mut self, line: &str) -> Result<(), FsError> {
        let rest = line.trim_start().strip_prefix("write").unwrap_or("");
        let rest = rest.trim_start();
        let (fd_token, data) = rest
            .split_once(|c: char| c.is_whitespace())
            .ok_or(FsError::InvalidArgument)?;
        let fd = parse_fd(Some(&fd_token))?;
        let data = data.trim_end_matches(['\r', '\n']);

        let written = self.mounted()?.write_file(fd, data.as_bytes())?;
        println!("Wrote {written} bytes");
        Ok(())
    }

    fn cmd_chmod(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let (path, mode) = match tokens {
            [_, path, mode] => (*path, *mode),
            _ => return Err(FsError::InvalidArgument),
        };
        let mode = u16::from_str_radix(mode, 8).map_err(|_| FsError::InvalidArgument)?;
        self.mounted()?.change_mode(path, mode)?;
        println!("Permissions changed: {path}");
        Ok(())
    }

    fn cmd_chown(&mut self, tokens: &[&str]) -> Result<(), FsError> {
        let (path, uid, gid) = match tokens {
            [_, path, uid, gid] => (*path, *uid, *gid),
            _ => return Err(FsError::InvalidArgument),
        };
        let uid: u16 = uid.parse().map_err(|_| FsError::InvalidArgument)?;
        let gid: u16 = gid.parse().map_err(|_| FsError::InvalidArgument)?;
        self.mounted()?.change_owner(path, uid, gid)?;
        println!("Owner changed: {path}");
        Ok(())
    }
}

impl Default for Shell {
    fn default() -> Shell {
        Shell::new()
    }
}

fn parse_fd(token: Option<&&str>) -> Result<u32, FsError> {
    token
        .and_then(|token| token.parse().ok())
        .ok_or(FsError::InvalidArgument)
}

fn print_help() {
    println!("Available commands:");
    println!("  format <disk_image>      - Format a new disk image");
    println!("  mount <disk_image>       - Mount a disk image");
    println!("  umount                   - Unmount current disk image");
    println!("  status                   - Show file system status");
    println!("  login <user> <pass>      - Login as user");
    println!("  logout                   - Logout current user");
    println!("  users                    - List all users");
    println!("  mkdir <path>             - Create directory");
    println!("  rmdir <path>             - Remove directory");
    println!("  dir [path]               - List directory contents");
    println!("  cd <path>                - Change directory");
    println!("  create <path>            - Create file");
    println!("  delete <path>            - Delete file");
    println!("  open <path> <flags>      - Open file (0=read, 1=write, 2=readwrite)");
    println!("  close <fd>               - Close file");
    println!("  read <fd> <size>         - Read from file");
    println!("  write <fd> <data>        - Write to file");
    println!("  chmod <path> <mode>      - Change file permissions");
    println!("  chown <path> <uid> <gid> - Change file owner");
    println!("  help                     - Show this help");
    println!("  quit                     - Exit program");
}

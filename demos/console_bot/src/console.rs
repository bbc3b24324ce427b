//! Terminal stand-ins for the platform collaborators.

use async_trait::async_trait;

use herald::core::{
    Channel, ChannelContext, EntityLookup, GuildId, LookupResult, Member, Responder,
    ResponderError, Role, User,
};

/// Prints replies to stdout.
pub struct ConsoleResponder;

#[async_trait]
impl Responder for ConsoleResponder {
    async fn send(&self, channel: &ChannelContext, text: &str) -> Result<(), ResponderError> {
        let place = match &channel.guild_id {
            Some(guild) => format!("{guild}#{}", channel.channel_id),
            None => format!("dm:{}", channel.channel_id),
        };
        for line in text.lines() {
            println!("[{place}] bot: {line}");
        }
        Ok(())
    }
}

/// A fixed guild population.
pub struct Directory {
    users: Vec<User>,
    roles: Vec<(&'static str, &'static str)>,
    channels: Vec<(&'static str, &'static str)>,
}

impl Directory {
    pub fn sample() -> Self {
        Self {
            users: vec![
                User::new("1001", "ada"),
                User::new("1002", "grace"),
                User::new("1003", "linus"),
            ],
            roles: vec![("2001", "moderators"), ("2002", "regulars")],
            channels: vec![("3001", "general"), ("3002", "bot-spam")],
        }
    }

    /// Matches an ID exactly or a name case-insensitively.
    fn matches(id: &str, name: &str, query: &str) -> bool {
        id == query || name.eq_ignore_ascii_case(query)
    }
}

#[async_trait]
impl EntityLookup for Directory {
    async fn find_user(&self, query: &str) -> LookupResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| Self::matches(u.id.as_str(), &u.name, query))
            .cloned())
    }

    async fn find_member(&self, guild: &GuildId, query: &str) -> LookupResult<Option<Member>> {
        let user = self.find_user(query).await?;
        Ok(user.map(|u| Member::new(guild.clone(), u)))
    }

    async fn find_role(&self, guild: &GuildId, query: &str) -> LookupResult<Option<Role>> {
        Ok(self
            .roles
            .iter()
            .find(|(id, name)| Self::matches(id, name, query))
            .map(|(id, name)| Role::new(*id, guild.clone(), *name)))
    }

    async fn find_channel(&self, guild: &GuildId, query: &str) -> LookupResult<Option<Channel>> {
        Ok(self
            .channels
            .iter()
            .find(|(id, name)| Self::matches(id, name, query))
            .map(|(id, name)| Channel::text(*id, guild.clone(), *name)))
    }
}

/*!

This is the long-form manual for `stv_voting` and `stvtally`.

## Transcripts

Ballots are collected from the raw text of discussion threads, as copied from a chat
client. Every voter posts one message with their ranked list of candidates:

```text
Dr Bacon Hair — 3/14/2026 6:14 PM
1. Toast
2. @Minemaster (my second favourite)
3. "Alzu"
HSM_NewFriend — Yesterday at 9:02 AM
mayor toast
minemaster
```

A message header is a line with a timestamp in one of these forms: a dash followed by
a date (`— 3/14/2026`), `— Yesterday at` or `— Today at`. Some clients split the header
in two lines: the display name alone, then a line with only the timestamp. The text
posted after the clock time on the header line counts as the first ranking.

The ranking lines are cleaned before matching:
* mentions (`@`), leading list numbers (`1.`, `2 `), quotes and parenthetical asides are removed
* blank lines and lines made of punctuation only are ignored
* lines mentioning a disqualification or a write-in are dropped, and reported in the
  `droppedLines` section of the summary

The voter identity is the display name without role titles (`Mayor`, `Councillor`,
`Sir`, ...) and reduced to lowercase ASCII letters, digits and underscores. A voter
who posts several ballots gets distinct identities: `name`, `name#2`, `name#3`.

When a transcript is known to contain the ballot of a single voter (for example a
ballot sent privately), the `voterKey` gives that voter. The rankings found before any
header are then attributed to this voter, and a header line that starts with the voter
key opens the ballot even without a timestamp.

## Name matching

Ranking lines are matched to the registered candidates in this order:
1. the `nameMatches` overrides of the configuration
2. a case-insensitive comparison with the candidate names
3. a comparison of the simplified forms (as for voter names)
4. a prefix of at least 3 characters that designates a single candidate

Texts that do not match any candidate are skipped and listed in the `unmatchedNames`
section of the summary. An override to `null` or `"__NOT_A_BALLOT__"` marks a text as
not being a vote, and it is skipped silently.

## Counting

The count is a single transferable vote with a dynamic quota: at every round, the quota
is the voting power of the ballots still in play divided by the number of seats plus one.
The top candidate is elected if their score reaches the quota, and the ballots that
supported them are scaled down so that only the surplus moves on. Otherwise the
candidate with the lowest score is eliminated.

The score of a candidate is their primary votes, plus a small fraction of the second
(0.001) and third (0.000001) live preferences. These fractions only matter to break ties
and can be changed in the `rules` section of the configuration.

A blank choice ends the preferences of a ballot. Ballots without a live preference are
exhausted and leave the count at the end of the round. Empty ballots still count
in the quota of the first round.

## Configuration

`stvtally` accepts a configuration file in JSON:

```json
{
  "outputSettings": {
    "contestName": "Spring council election",
    "contestDate": "2026-03-14",
    "outputDirectory": "output"
  },
  "seats": 2,
  "candidates": ["Toast", "Minemaster", "Alzu"],
  "transcripts": [
    { "filePath": "thread.txt" },
    { "filePath": "private_ballot.txt", "voterKey": "Dr Bacon Hair" }
  ],
  "nameMatches": {
    "the toaster": "Toast",
    "hello everyone": null
  },
  "rules": {
    "secondChoiceWeight": 0.001,
    "thirdChoiceWeight": 0.000001
  }
}
```

The paths of the transcripts are relative to the configuration file. The output
directory, when provided, receives the summary in `summary.json`.

All the sections are optional except `candidates` and `transcripts`. The number of seats
defaults to 1.

 */
